use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AdminUser,
    dialects::repo::Dialect,
    error::{is_unique_violation, ApiError, AppJson},
    pagination::{Paginated, Pagination},
    state::AppState,
    terms::repo::Term,
    translations::{
        dto::{CreateTranslationRequest, TranslationFilter, UpdateTranslationRequest},
        repo::Translation,
    },
};

/// Translation detail embeds the term and dialect it connects.
#[derive(Debug, Serialize)]
pub struct TranslationDetail {
    #[serde(flatten)]
    pub translation: Translation,
    pub term: Term,
    pub dialect: Dialect,
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
    Query(filter): Query<TranslationFilter>,
) -> Result<Json<Paginated<Translation>>, ApiError> {
    let (rows, total) = Translation::list(&state.db, &filter, &page).await?;
    Ok(Json(Paginated::new(rows, &page, total)))
}

#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TranslationDetail>, ApiError> {
    let translation = Translation::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Translation not found"))?;

    let term = Term::get(&state.db, translation.term_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Term not found"))?;
    let dialect = Dialect::get(&state.db, translation.dialect_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Dialect not found"))?;

    Ok(Json(TranslationDetail {
        translation,
        term,
        dialect,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    AppJson(payload): AppJson<CreateTranslationRequest>,
) -> Result<(StatusCode, Json<Translation>), ApiError> {
    validate_fields(Some(&payload.translated_term), Some(payload.confidence_level))?;

    // Both ends must exist before the row is created.
    if Term::get(&state.db, payload.term_id).await?.is_none() {
        return Err(ApiError::not_found("Term not found"));
    }
    if Dialect::get(&state.db, payload.dialect_id).await?.is_none() {
        return Err(ApiError::not_found("Dialect not found"));
    }

    match Translation::create(&state.db, &payload).await {
        Ok(translation) => {
            info!(
                translation_id = translation.id,
                term_id = payload.term_id,
                dialect_id = payload.dialect_id,
                by = identity.user_id,
                "translation created"
            );
            Ok((StatusCode::CREATED, Json(translation)))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(
                term_id = payload.term_id,
                dialect_id = payload.dialect_id,
                "duplicate translation"
            );
            Err(ApiError::conflict(
                "Translation for this term and dialect already exists",
            ))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateTranslationRequest>,
) -> Result<Json<Translation>, ApiError> {
    validate_fields(payload.translated_term.as_deref(), payload.confidence_level)?;

    match Translation::update(&state.db, id, &payload).await? {
        Some(translation) => {
            info!(translation_id = id, by = identity.user_id, "translation updated");
            Ok(Json(translation))
        }
        None => Err(ApiError::not_found("Translation not found")),
    }
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Translation>, ApiError> {
    match Translation::deactivate(&state.db, id).await? {
        Some(translation) => {
            info!(translation_id = id, by = identity.user_id, "translation deactivated");
            Ok(Json(translation))
        }
        None => Err(ApiError::not_found("Translation not found")),
    }
}

fn validate_fields(
    translated_term: Option<&str>,
    confidence_level: Option<i32>,
) -> Result<(), ApiError> {
    if let Some(translated_term) = translated_term {
        if translated_term.is_empty() {
            return Err(ApiError::bad_request("translatedTerm must not be empty"));
        }
    }
    if let Some(confidence) = confidence_level {
        if !(0..=100).contains(&confidence) {
            return Err(ApiError::bad_request(
                "confidenceLevel must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_must_stay_in_range() {
        assert!(validate_fields(Some("SELECT"), Some(100)).is_ok());
        assert!(validate_fields(Some("SELECT"), Some(0)).is_ok());
        assert!(validate_fields(None, Some(101)).is_err());
        assert!(validate_fields(None, Some(-1)).is_err());
        assert!(validate_fields(Some(""), None).is_err());
    }
}
