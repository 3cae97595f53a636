use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AdminUser,
    error::{is_unique_violation, ApiError, AppJson},
    pagination::{Paginated, Pagination},
    state::AppState,
    terms::{
        dto::{
            CreateEquivalentRequest, CreateTermRequest, TermFilter, UpdateEquivalentRequest,
            UpdateTermRequest,
        },
        repo::{Term, TermEquivalent},
    },
    translations::repo::Translation,
};

/// Term detail embeds its per-dialect translations.
#[derive(Debug, Serialize)]
pub struct TermDetail {
    #[serde(flatten)]
    pub term: Term,
    pub translations: Vec<Translation>,
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
    Query(filter): Query<TermFilter>,
) -> Result<Json<Paginated<Term>>, ApiError> {
    let (rows, total) = Term::list(&state.db, &filter, &page).await?;
    Ok(Json(Paginated::new(rows, &page, total)))
}

#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TermDetail>, ApiError> {
    let term = Term::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Term not found"))?;
    let translations = Translation::list_for_term(&state.db, id).await?;
    Ok(Json(TermDetail { term, translations }))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    AppJson(payload): AppJson<CreateTermRequest>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    validate_term_fields(
        Some(&payload.canonical_term),
        Some(&payload.category),
        Some(&payload.description),
    )?;

    let term = Term::create(&state.db, &payload).await?;
    info!(term_id = term.id, canonical_term = %term.canonical_term, by = identity.user_id, "term created");
    Ok((StatusCode::CREATED, Json(term)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateTermRequest>,
) -> Result<Json<Term>, ApiError> {
    validate_term_fields(
        payload.canonical_term.as_deref(),
        payload.category.as_deref(),
        payload.description.as_deref(),
    )?;

    match Term::update(&state.db, id, &payload).await? {
        Some(term) => {
            info!(term_id = id, by = identity.user_id, "term updated");
            Ok(Json(term))
        }
        None => Err(ApiError::not_found("Term not found")),
    }
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Term>, ApiError> {
    match Term::deactivate(&state.db, id).await? {
        Some(term) => {
            info!(term_id = id, by = identity.user_id, "term deactivated");
            Ok(Json(term))
        }
        None => Err(ApiError::not_found("Term not found")),
    }
}

// --- platform equivalents, nested under /terms/:termId/equivalents ---

#[instrument(skip(state))]
pub async fn list_equivalents(
    State(state): State<AppState>,
    Path(term_id): Path<i64>,
) -> Result<Json<Vec<TermEquivalent>>, ApiError> {
    require_term(&state, term_id).await?;
    let equivalents = TermEquivalent::list_for_term(&state.db, term_id).await?;
    Ok(Json(equivalents))
}

#[instrument(skip(state, payload))]
pub async fn create_equivalent(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(term_id): Path<i64>,
    AppJson(payload): AppJson<CreateEquivalentRequest>,
) -> Result<(StatusCode, Json<TermEquivalent>), ApiError> {
    validate_equivalent_fields(Some(&payload.platform), Some(&payload.equivalent_term))?;
    require_term(&state, term_id).await?;

    match TermEquivalent::create(&state.db, term_id, &payload).await {
        Ok(equivalent) => {
            info!(term_id, platform = %equivalent.platform, by = identity.user_id, "equivalent created");
            Ok((StatusCode::CREATED, Json(equivalent)))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(term_id, platform = %payload.platform, "duplicate platform equivalent");
            Err(ApiError::conflict(
                "Equivalent for this platform already exists",
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_equivalent(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path((term_id, id)): Path<(i64, i64)>,
    AppJson(payload): AppJson<UpdateEquivalentRequest>,
) -> Result<Json<TermEquivalent>, ApiError> {
    validate_equivalent_fields(payload.platform.as_deref(), payload.equivalent_term.as_deref())?;

    if TermEquivalent::find(&state.db, term_id, id).await?.is_none() {
        return Err(ApiError::not_found("Equivalent not found"));
    }

    match TermEquivalent::update(&state.db, id, &payload).await {
        Ok(Some(equivalent)) => {
            info!(term_id, equivalent_id = id, by = identity.user_id, "equivalent updated");
            Ok(Json(equivalent))
        }
        Ok(None) => Err(ApiError::not_found("Equivalent not found")),
        Err(e) if is_unique_violation(&e) => Err(ApiError::conflict(
            "Equivalent for this platform already exists",
        )),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state))]
pub async fn delete_equivalent(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path((term_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    if TermEquivalent::find(&state.db, term_id, id).await?.is_none() {
        return Err(ApiError::not_found("Equivalent not found"));
    }
    TermEquivalent::delete(&state.db, id).await?;
    info!(term_id, equivalent_id = id, by = identity.user_id, "equivalent deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn require_term(state: &AppState, term_id: i64) -> Result<(), ApiError> {
    Term::get(&state.db, term_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Term not found"))
}

fn validate_term_fields(
    canonical_term: Option<&str>,
    category: Option<&str>,
    description: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(canonical_term) = canonical_term {
        if canonical_term.is_empty() || canonical_term.len() > 200 {
            return Err(ApiError::bad_request("canonicalTerm must be 1-200 characters"));
        }
    }
    if let Some(category) = category {
        if category.is_empty() || category.len() > 50 {
            return Err(ApiError::bad_request("category must be 1-50 characters"));
        }
    }
    if let Some(description) = description {
        if description.is_empty() {
            return Err(ApiError::bad_request("description must not be empty"));
        }
    }
    Ok(())
}

fn validate_equivalent_fields(
    platform: Option<&str>,
    equivalent_term: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(platform) = platform {
        if platform.is_empty() || platform.len() > 100 {
            return Err(ApiError::bad_request("platform must be 1-100 characters"));
        }
    }
    if let Some(equivalent_term) = equivalent_term {
        if equivalent_term.is_empty() || equivalent_term.len() > 200 {
            return Err(ApiError::bad_request(
                "equivalentTerm must be 1-200 characters",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_field_bounds() {
        assert!(validate_term_fields(Some("SELECT"), Some("DQL"), Some("desc")).is_ok());
        assert!(validate_term_fields(Some(""), None, None).is_err());
        assert!(validate_term_fields(None, Some(&"x".repeat(51)), None).is_err());
        assert!(validate_term_fields(None, None, Some("")).is_err());
        assert!(validate_term_fields(None, None, None).is_ok());
    }

    #[test]
    fn equivalent_field_bounds() {
        assert!(validate_equivalent_fields(Some("snowflake"), Some("SELECT")).is_ok());
        assert!(validate_equivalent_fields(Some(""), None).is_err());
        assert!(validate_equivalent_fields(None, Some(&"x".repeat(201))).is_err());
    }
}
