use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_confidence() -> i32 {
    100
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTranslationRequest {
    pub term_id: i64,
    pub dialect_id: i64,
    pub translated_term: String,
    pub syntax_pattern: Option<String>,
    pub examples: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence_level: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTranslationRequest {
    pub translated_term: Option<String>,
    pub syntax_pattern: Option<String>,
    pub examples: Option<String>,
    pub notes: Option<String>,
    pub confidence_level: Option<i32>,
    pub is_active: Option<bool>,
}

/// List filters: `?termId=&dialectId=&isActive=&minConfidence=`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationFilter {
    pub term_id: Option<i64>,
    pub dialect_id: Option<i64>,
    pub is_active: Option<bool>,
    pub min_confidence: Option<i32>,
}
