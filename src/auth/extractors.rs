use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{
        claims::{Identity, Role, TokenKind},
        jwt::JwtKeys,
    },
    error::ApiError,
    state::AppState,
};

/// Verified bearer identity. Rejects with a generic 401; the specific
/// verification failure stays in the logs.
pub struct AuthUser(pub Identity);

/// Bearer identity gated on the admin role: 401 without a valid identity,
/// 403 for a non-admin one.
pub struct AdminUser(pub Identity);

/// Optional variant: never fails the request, handlers apply their own
/// policy when no identity is attached.
pub struct MaybeAuthUser(pub Option<Identity>);

fn bearer_token<'a>(parts: &'a Parts) -> Result<&'a str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid Authorization header"))
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Identity, ApiError> {
    let token = bearer_token(parts)?;
    let keys = JwtKeys::from_ref(state);

    let claims = keys.verify(token).map_err(|reason| {
        warn!(%reason, "bearer token rejected");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    // Refresh tokens are good for /auth/refresh only.
    if claims.kind != TokenKind::Access {
        warn!(user_id = claims.user_id, "refresh token presented as bearer");
        return Err(ApiError::unauthorized("Invalid or expired token"));
    }

    Ok(Identity::from(claims))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(AuthUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = authenticate(parts, state)?;
        if identity.role != Role::Admin {
            warn!(
                user_id = identity.user_id,
                role = identity.role.as_str(),
                "admin gate rejected request"
            );
            return Err(ApiError::forbidden("Insufficient permissions"));
        }
        Ok(AdminUser(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(authenticate(parts, state).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/auth/me");
        if let Some(value) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn token_for(state: &AppState, role: Role, kind: TokenKind) -> String {
        let keys = JwtKeys::from_ref(state);
        let identity = Identity {
            user_id: 1,
            email: "alice@example.com".into(),
            role,
        };
        match kind {
            TokenKind::Access => keys.sign_access(&identity).unwrap(),
            TokenKind::Refresh => keys.sign_refresh(&identity).unwrap(),
        }
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn malformed_scheme_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Basic abc"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer not-a-jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn valid_access_token_attaches_identity() {
        let state = AppState::fake();
        let token = token_for(&state, Role::User, TokenKind::Access);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let AuthUser(identity) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.user_id, 1);
        assert_eq!(identity.email, "alice@example.com");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn refresh_token_is_rejected_as_bearer() {
        let state = AppState::fake();
        let token = token_for(&state, Role::User, TokenKind::Refresh);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn admin_gate_rejects_user_role_with_403() {
        let state = AppState::fake();
        let token = token_for(&state, Role::User, TokenKind::Access);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_gate_accepts_admin_role() {
        let state = AppState::fake();
        let token = token_for(&state, Role::Admin, TokenKind::Access);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let AdminUser(identity) = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn admin_gate_without_identity_is_401_not_403() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn optional_variant_never_rejects() {
        let state = AppState::fake();

        let mut parts = parts_with_auth(None);
        let MaybeAuthUser(identity) = MaybeAuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(identity.is_none());

        let token = token_for(&state, Role::User, TokenKind::Access);
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let MaybeAuthUser(identity) = MaybeAuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(identity.is_some());
    }
}
