use serde::Deserialize;

fn default_status() -> String {
    "draft".into()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtifactRequest {
    pub name: String,
    pub artifact_type: String,
    pub source_dialect_id: Option<i64>,
    pub target_dialect_id: Option<i64>,
    pub original_sql: Option<String>,
    pub translated_sql: Option<String>,
    pub translation_summary: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArtifactRequest {
    pub name: Option<String>,
    pub artifact_type: Option<String>,
    pub source_dialect_id: Option<i64>,
    pub target_dialect_id: Option<i64>,
    pub original_sql: Option<String>,
    pub translated_sql: Option<String>,
    pub translation_summary: Option<String>,
    pub status: Option<String>,
}

/// List filters: `?artifactType=&status=&sourceDialectId=&targetDialectId=&search=`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFilter {
    pub artifact_type: Option<String>,
    pub status: Option<String>,
    pub source_dialect_id: Option<i64>,
    pub target_dialect_id: Option<i64>,
    pub search: Option<String>,
}
