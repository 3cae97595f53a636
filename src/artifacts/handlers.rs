use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use crate::{
    artifacts::{
        dto::{ArtifactFilter, CreateArtifactRequest, UpdateArtifactRequest},
        repo::Artifact,
    },
    auth::extractors::AdminUser,
    dialects::repo::Dialect,
    error::{ApiError, AppJson},
    pagination::{Paginated, Pagination},
    state::AppState,
};

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
    Query(filter): Query<ArtifactFilter>,
) -> Result<Json<Paginated<Artifact>>, ApiError> {
    let (rows, total) = Artifact::list(&state.db, &filter, &page).await?;
    Ok(Json(Paginated::new(rows, &page, total)))
}

#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Artifact>, ApiError> {
    Artifact::get(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Artifact not found"))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    AppJson(payload): AppJson<CreateArtifactRequest>,
) -> Result<(StatusCode, Json<Artifact>), ApiError> {
    validate_fields(Some(&payload.name), Some(&payload.artifact_type))?;
    require_dialect(&state, payload.source_dialect_id, "Source dialect not found").await?;
    require_dialect(&state, payload.target_dialect_id, "Target dialect not found").await?;

    let artifact = Artifact::create(&state.db, &payload).await?;
    info!(artifact_id = artifact.id, name = %artifact.name, by = identity.user_id, "artifact created");
    Ok((StatusCode::CREATED, Json(artifact)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateArtifactRequest>,
) -> Result<Json<Artifact>, ApiError> {
    validate_fields(payload.name.as_deref(), payload.artifact_type.as_deref())?;
    require_dialect(&state, payload.source_dialect_id, "Source dialect not found").await?;
    require_dialect(&state, payload.target_dialect_id, "Target dialect not found").await?;

    match Artifact::update(&state.db, id, &payload).await? {
        Some(artifact) => {
            info!(artifact_id = id, by = identity.user_id, "artifact updated");
            Ok(Json(artifact))
        }
        None => Err(ApiError::not_found("Artifact not found")),
    }
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !Artifact::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Artifact not found"));
    }
    info!(artifact_id = id, by = identity.user_id, "artifact deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn require_dialect(
    state: &AppState,
    dialect_id: Option<i64>,
    message: &'static str,
) -> Result<(), ApiError> {
    if let Some(dialect_id) = dialect_id {
        if Dialect::get(&state.db, dialect_id).await?.is_none() {
            return Err(ApiError::not_found(message));
        }
    }
    Ok(())
}

fn validate_fields(name: Option<&str>, artifact_type: Option<&str>) -> Result<(), ApiError> {
    if let Some(name) = name {
        if name.is_empty() || name.len() > 200 {
            return Err(ApiError::bad_request("name must be 1-200 characters"));
        }
    }
    if let Some(artifact_type) = artifact_type {
        if artifact_type.is_empty() || artifact_type.len() > 50 {
            return Err(ApiError::bad_request("artifactType must be 1-50 characters"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_field_bounds() {
        assert!(validate_fields(Some("orders-migration"), Some("stored_procedure")).is_ok());
        assert!(validate_fields(Some(""), None).is_err());
        assert!(validate_fields(None, Some(&"x".repeat(51))).is_err());
        assert!(validate_fields(None, None).is_ok());
    }
}
