use serde::Deserialize;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermRequest {
    pub canonical_term: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub usage_context: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTermRequest {
    pub canonical_term: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub usage_context: Option<String>,
    pub is_active: Option<bool>,
}

/// List filters: `?category=&subcategory=&isActive=&search=`. `search`
/// matches canonical term and description, case-insensitively.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquivalentRequest {
    pub platform: String,
    pub equivalent_term: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquivalentRequest {
    pub platform: Option<String>,
    pub equivalent_term: Option<String>,
    pub notes: Option<String>,
}
