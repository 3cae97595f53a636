use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    pub required: bool,
}

struct EntityInfo {
    name: &'static str,
    table: &'static str,
    fields: &'static [FieldInfo],
}

const fn field(name: &'static str, field_type: &'static str, required: bool) -> FieldInfo {
    FieldInfo {
        name,
        field_type,
        required,
    }
}

const ENTITIES: &[EntityInfo] = &[
    EntityInfo {
        name: "dialects",
        table: "dialects",
        fields: &[
            field("id", "integer", true),
            field("name", "string", true),
            field("displayName", "string", true),
            field("version", "string", false),
            field("description", "string", false),
            field("isActive", "boolean", true),
            field("createdAt", "datetime", true),
        ],
    },
    EntityInfo {
        name: "terms",
        table: "terms",
        fields: &[
            field("id", "integer", true),
            field("canonicalTerm", "string", true),
            field("category", "string", true),
            field("subcategory", "string", false),
            field("description", "string", true),
            field("usageContext", "string", false),
            field("isActive", "boolean", true),
            field("createdAt", "datetime", true),
        ],
    },
    EntityInfo {
        name: "translations",
        table: "translations",
        fields: &[
            field("id", "integer", true),
            field("termId", "integer", true),
            field("dialectId", "integer", true),
            field("translatedTerm", "string", true),
            field("syntaxPattern", "string", false),
            field("examples", "string", false),
            field("notes", "string", false),
            field("confidenceLevel", "integer", true),
            field("isActive", "boolean", true),
            field("createdAt", "datetime", true),
        ],
    },
    EntityInfo {
        name: "artifacts",
        table: "artifacts",
        fields: &[
            field("id", "integer", true),
            field("name", "string", true),
            field("artifactType", "string", true),
            field("sourceDialectId", "integer", false),
            field("targetDialectId", "integer", false),
            field("originalSql", "string", false),
            field("translatedSql", "string", false),
            field("translationSummary", "string", false),
            field("status", "string", true),
            field("createdAt", "datetime", true),
        ],
    },
];

fn entity_info(name: &str) -> Option<&'static EntityInfo> {
    ENTITIES.iter().find(|entity| entity.name == name)
}

#[instrument]
pub async fn overview() -> Json<Value> {
    let entities: Vec<Value> = ENTITIES
        .iter()
        .map(|entity| json!({ "entity": entity.name, "fields": entity.fields }))
        .collect();

    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "schema": "dbrosetta",
        "entities": entities,
    }))
}

#[instrument(skip(state))]
pub async fn entity(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let entity = entity_info(&name)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown entity '{name}'")))?;

    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", entity.table))
        .fetch_one(&state.db)
        .await?;

    let sample: Option<Value> = sqlx::query_scalar(&format!(
        "SELECT row_to_json(t) FROM (SELECT * FROM {} LIMIT 1) t",
        entity.table
    ))
    .fetch_optional(&state.db)
    .await?;

    Ok(Json(json!({
        "entity": entity.name,
        "count": count,
        "fields": entity.fields,
        "sample": sample,
    })))
}

#[instrument(skip(state))]
pub async fn stats_overview(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut totals = serde_json::Map::new();
    let mut active = serde_json::Map::new();
    let mut percentage_active = serde_json::Map::new();

    for entity in ENTITIES {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", entity.table))
            .fetch_one(&state.db)
            .await?;
        totals.insert(entity.name.to_string(), json!(total));

        // Artifacts track a status lifecycle rather than an active flag.
        if entity.fields.iter().any(|f| f.name == "isActive") {
            let active_count: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE is_active = TRUE",
                entity.table
            ))
            .fetch_one(&state.db)
            .await?;
            active.insert(entity.name.to_string(), json!(active_count));

            let percentage = if total > 0 {
                (active_count as f64 / total as f64 * 100.0).round()
            } else {
                0.0
            };
            percentage_active.insert(entity.name.to_string(), json!(percentage));
        }
    }

    Ok(Json(json!({
        "totals": totals,
        "active": active,
        "percentageActive": percentage_active,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schema", get(overview))
        .route("/schema/stats/overview", get(stats_overview))
        .route("/schema/:entity", get(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_four_entities_are_described() {
        let names: Vec<_> = ENTITIES.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["dialects", "terms", "translations", "artifacts"]);
    }

    #[test]
    fn unknown_entity_is_not_resolved() {
        assert!(entity_info("users").is_none());
        assert!(entity_info("dialects").is_some());
    }

    #[test]
    fn field_info_serializes_with_type_key() {
        let info = field("id", "integer", true);
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["name"], "id");
        assert_eq!(json["type"], "integer");
        assert_eq!(json["required"], true);
    }
}
