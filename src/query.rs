use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use crate::{
    auth::extractors::MaybeAuthUser,
    error::{ApiError, AppJson},
    pagination::SortOrder,
    state::AppState,
};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// A queryable entity: wire name, backing table and the (wire field, column)
/// pairs callers may select, filter and order by. Identifiers only ever come
/// from this table; request values are always bound.
#[derive(Debug)]
struct EntitySpec {
    name: &'static str,
    table: &'static str,
    fields: &'static [(&'static str, &'static str)],
}

const ENTITIES: &[EntitySpec] = &[
    EntitySpec {
        name: "dialects",
        table: "dialects",
        fields: &[
            ("id", "id"),
            ("name", "name"),
            ("displayName", "display_name"),
            ("version", "version"),
            ("description", "description"),
            ("isActive", "is_active"),
        ],
    },
    EntitySpec {
        name: "terms",
        table: "terms",
        fields: &[
            ("id", "id"),
            ("canonicalTerm", "canonical_term"),
            ("category", "category"),
            ("subcategory", "subcategory"),
            ("description", "description"),
            ("usageContext", "usage_context"),
            ("isActive", "is_active"),
        ],
    },
    EntitySpec {
        name: "translations",
        table: "translations",
        fields: &[
            ("id", "id"),
            ("termId", "term_id"),
            ("dialectId", "dialect_id"),
            ("translatedTerm", "translated_term"),
            ("syntaxPattern", "syntax_pattern"),
            ("examples", "examples"),
            ("notes", "notes"),
            ("confidenceLevel", "confidence_level"),
            ("isActive", "is_active"),
        ],
    },
    EntitySpec {
        name: "artifacts",
        table: "artifacts",
        fields: &[
            ("id", "id"),
            ("name", "name"),
            ("artifactType", "artifact_type"),
            ("sourceDialectId", "source_dialect_id"),
            ("targetDialectId", "target_dialect_id"),
            ("translationSummary", "translation_summary"),
            ("status", "status"),
        ],
    },
];

fn entity_spec(name: &str) -> Option<&'static EntitySpec> {
    ENTITIES.iter().find(|spec| spec.name == name)
}

fn column_for(spec: &EntitySpec, field: &str) -> Option<&'static str> {
    spec.fields
        .iter()
        .find(|(wire, _)| *wire == field)
        .map(|(_, column)| *column)
}

#[derive(Debug, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortOrder,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub entity: String,
    pub filters: Option<serde_json::Map<String, Value>>,
    pub fields: Option<Vec<String>>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug)]
struct QueryPlan {
    spec: &'static EntitySpec,
    select: Vec<(&'static str, &'static str)>,
    filters: Vec<(&'static str, Value)>,
    order: Option<(&'static str, SortOrder)>,
    limit: i64,
    offset: i64,
}

/// Validate the request against the whitelist and produce the execution
/// plan. Everything that could influence SQL identifiers is resolved here.
fn plan_query(req: &QueryRequest) -> Result<QueryPlan, ApiError> {
    let spec = entity_spec(&req.entity)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown entity '{}'", req.entity)))?;

    let limit = req.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    let offset = req.offset.unwrap_or(0).max(0);

    let select = match &req.fields {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|field| {
                let (wire, column) = spec
                    .fields
                    .iter()
                    .find(|(wire, _)| *wire == field.as_str())
                    .ok_or_else(|| {
                        ApiError::bad_request(format!("Unknown field '{field}'"))
                    })?;
                Ok((*wire, *column))
            })
            .collect::<Result<Vec<_>, ApiError>>()?,
        _ => spec.fields.to_vec(),
    };

    let mut filters = Vec::new();
    if let Some(requested) = &req.filters {
        for (field, value) in requested {
            let column = column_for(spec, field)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown filter '{field}'")))?;
            match value {
                Value::Bool(_) | Value::String(_) | Value::Null => {}
                Value::Number(n) if n.is_i64() => {}
                _ => {
                    return Err(ApiError::bad_request(format!(
                        "Unsupported filter value for '{field}'"
                    )))
                }
            }
            filters.push((column, value.clone()));
        }
    }

    let order = match &req.order_by {
        Some(order_by) => {
            let column = column_for(spec, &order_by.field).ok_or_else(|| {
                ApiError::bad_request(format!("Unknown orderBy field '{}'", order_by.field))
            })?;
            Some((column, order_by.direction))
        }
        None => None,
    };

    Ok(QueryPlan {
        spec,
        select,
        filters,
        order,
        limit,
        offset,
    })
}

#[instrument(skip(state, payload))]
pub async fn run_query(
    State(state): State<AppState>,
    MaybeAuthUser(identity): MaybeAuthUser,
    AppJson(payload): AppJson<QueryRequest>,
) -> Result<Json<Value>, ApiError> {
    let plan = plan_query(&payload)?;

    let select_list = plan
        .select
        .iter()
        .map(|(wire, column)| format!("{column} AS \"{wire}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
        "SELECT COALESCE(json_agg(row_to_json(t)), '[]'::json) FROM \
         (SELECT {select_list} FROM {} WHERE 1=1",
        plan.spec.table
    ));

    for (column, value) in &plan.filters {
        match value {
            Value::Null => {
                qb.push(format!(" AND {column} IS NULL"));
            }
            Value::Bool(b) => {
                qb.push(format!(" AND {column} = "));
                qb.push_bind(*b);
            }
            Value::Number(n) => {
                qb.push(format!(" AND {column} = "));
                qb.push_bind(n.as_i64().unwrap_or_default());
            }
            Value::String(s) => {
                qb.push(format!(" AND {column} = "));
                qb.push_bind(s.clone());
            }
            _ => unreachable!("rejected by plan_query"),
        }
    }

    if let Some((column, direction)) = plan.order {
        qb.push(format!(" ORDER BY {column} {}", direction.as_sql()));
    }
    qb.push(" LIMIT ");
    qb.push_bind(plan.limit);
    qb.push(" OFFSET ");
    qb.push_bind(plan.offset);
    qb.push(") t");

    let data: Value = qb.build_query_scalar().fetch_one(&state.db).await?;
    let count = data.as_array().map(|rows| rows.len()).unwrap_or(0);

    // The endpoint is public; keep an audit trail of who ran what.
    tracing::info!(
        entity = plan.spec.name,
        count,
        caller = identity.as_ref().map(|i| i.user_id),
        "query executed"
    );

    Ok(Json(json!({
        "entity": plan.spec.name,
        "count": count,
        "data": data,
    })))
}

#[instrument]
pub async fn help() -> Json<Value> {
    let entities: Vec<Value> = ENTITIES
        .iter()
        .map(|spec| {
            json!({
                "entity": spec.name,
                "fields": spec.fields.iter().map(|(wire, _)| *wire).collect::<Vec<_>>(),
            })
        })
        .collect();

    Json(json!({
        "description": "Parameterized read-only queries over the dbRosetta entities. \
                        Field names are whitelisted per entity; filter values are bound.",
        "entities": entities,
        "limits": { "default": DEFAULT_LIMIT, "max": MAX_LIMIT },
        "examples": [
            { "entity": "dialects", "filters": { "isActive": true }, "limit": 10 },
            { "entity": "terms", "fields": ["id", "canonicalTerm"], "orderBy": { "field": "canonicalTerm", "direction": "asc" } },
            { "entity": "translations", "filters": { "dialectId": 1 }, "limit": 25, "offset": 25 }
        ],
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/query", post(run_query))
        .route("/query/help", get(help))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: Value) -> QueryRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn rejects_unknown_entity() {
        let err = plan_query(&request(json!({ "entity": "users" }))).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn rejects_limit_above_max() {
        let err = plan_query(&request(json!({ "entity": "dialects", "limit": 200 }))).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn rejects_unknown_field_and_filter() {
        let err = plan_query(&request(
            json!({ "entity": "dialects", "fields": ["passwordHash"] }),
        ))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = plan_query(&request(
            json!({ "entity": "dialects", "filters": { "password_hash": "x" } }),
        ))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn resolves_whitelisted_fields_to_columns() {
        let plan = plan_query(&request(json!({
            "entity": "translations",
            "fields": ["id", "termId", "confidenceLevel"],
            "filters": { "isActive": true, "dialectId": 3 },
            "orderBy": { "field": "confidenceLevel", "direction": "desc" },
        })))
        .unwrap();

        assert_eq!(plan.spec.table, "translations");
        assert_eq!(
            plan.select,
            vec![
                ("id", "id"),
                ("termId", "term_id"),
                ("confidenceLevel", "confidence_level")
            ]
        );
        assert_eq!(plan.filters.len(), 2);
        assert!(plan.filters.iter().any(|(col, _)| *col == "dialect_id"));
        assert!(plan.filters.iter().any(|(col, _)| *col == "is_active"));
        assert_eq!(plan.order, Some(("confidence_level", SortOrder::Desc)));
        assert_eq!(plan.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn defaults_to_all_fields() {
        let plan = plan_query(&request(json!({ "entity": "artifacts" }))).unwrap();
        assert_eq!(plan.select.len(), 7);
        assert_eq!(plan.offset, 0);
    }

    #[test]
    fn rejects_non_scalar_filter_values() {
        let err = plan_query(&request(
            json!({ "entity": "dialects", "filters": { "name": ["a", "b"] } }),
        ))
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
