use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AdminUser,
    dialects::{
        dto::{CreateDialectRequest, DialectFilter, UpdateDialectRequest},
        repo::Dialect,
    },
    error::{is_unique_violation, ApiError, AppJson},
    pagination::{Paginated, Pagination},
    state::AppState,
};

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
    Query(filter): Query<DialectFilter>,
) -> Result<Json<Paginated<Dialect>>, ApiError> {
    let (rows, total) = Dialect::list(&state.db, &filter, &page).await?;
    Ok(Json(Paginated::new(rows, &page, total)))
}

#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Dialect>, ApiError> {
    Dialect::get(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Dialect not found"))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    AppJson(payload): AppJson<CreateDialectRequest>,
) -> Result<(StatusCode, Json<Dialect>), ApiError> {
    validate_name(&payload.name)?;
    validate_display_name(&payload.display_name)?;

    match Dialect::create(&state.db, &payload).await {
        Ok(dialect) => {
            info!(dialect_id = dialect.id, name = %dialect.name, by = identity.user_id, "dialect created");
            Ok((StatusCode::CREATED, Json(dialect)))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(name = %payload.name, "duplicate dialect name");
            Err(ApiError::conflict("Dialect with this name already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateDialectRequest>,
) -> Result<Json<Dialect>, ApiError> {
    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(display_name) = &payload.display_name {
        validate_display_name(display_name)?;
    }

    match Dialect::update(&state.db, id, &payload).await {
        Ok(Some(dialect)) => {
            info!(dialect_id = id, by = identity.user_id, "dialect updated");
            Ok(Json(dialect))
        }
        Ok(None) => Err(ApiError::not_found("Dialect not found")),
        Err(e) if is_unique_violation(&e) => {
            Err(ApiError::conflict("Dialect with this name already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Dialect>, ApiError> {
    match Dialect::deactivate(&state.db, id).await? {
        Some(dialect) => {
            info!(dialect_id = id, by = identity.user_id, "dialect deactivated");
            Ok(Json(dialect))
        }
        None => Err(ApiError::not_found("Dialect not found")),
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 50 {
        return Err(ApiError::bad_request("name must be 1-50 characters"));
    }
    Ok(())
}

fn validate_display_name(display_name: &str) -> Result<(), ApiError> {
    if display_name.is_empty() || display_name.len() > 100 {
        return Err(ApiError::bad_request("displayName must be 1-100 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_bounds_are_enforced() {
        assert!(validate_name("postgresql").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
        assert!(validate_display_name("PostgreSQL 16").is_ok());
        assert!(validate_display_name(&"x".repeat(101)).is_err());
    }
}
