use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        claims::Role,
        dto::{
            AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse, MessageResponse,
            PublicUser, RefreshRequest, RegisterRequest, TokenPairResponse,
            WordPressAuthResponse, WordPressLoginRequest, WordPressUserView,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
        wordpress::{extract_email, verify_wordpress_token, WordPressTokenError},
    },
    error::{is_unique_violation, ApiError, AppJson},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
// Uniform wording for unknown email and wrong password, so responses don't
// reveal which accounts exist.
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const ACCOUNT_DEACTIVATED: &str = "Account has been deactivated";
const WP_VALIDATION_FAILED: &str = "WordPress token validation failed";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

fn issue_pair(keys: &JwtKeys, user: &User) -> Result<(String, String), ApiError> {
    let identity = user.identity();
    let token = keys.sign_access(&identity).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        ApiError::internal("Failed to issue tokens")
    })?;
    let refresh_token = keys.sign_refresh(&identity).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        ApiError::internal("Failed to issue tokens")
    })?;
    Ok((token, refresh_token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let hash = hash_password(payload.password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::internal("Failed to process password")
    })?;

    let user = match User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.name.as_deref(),
        Role::User,
    )
    .await
    {
        Ok(user) => user,
        // Concurrent register for the same email: the store's uniqueness is
        // the arbiter, the loser sees the same 409 as a sequential duplicate.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "lost registration race");
            return Err(ApiError::conflict("User with this email already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let (token, refresh_token) = issue_pair(&keys, &user)?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PublicUser::from(&user),
            token,
            refresh_token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };

    let ok = verify_password(payload.password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(error = %e, "verify_password failed");
            ApiError::internal("Failed to verify password")
        })?;

    if !ok {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if !user.is_active {
        warn!(user_id = user.id, "login for deactivated account");
        return Err(ApiError::forbidden(ACCOUNT_DEACTIVATED));
    }

    let keys = JwtKeys::from_ref(&state);
    let (token, refresh_token) = issue_pair(&keys, &user)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        user: PublicUser::from(&user),
        token,
        refresh_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn wordpress_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<WordPressLoginRequest>,
) -> Result<Json<WordPressAuthResponse>, ApiError> {
    let auto_register = payload.auto_register.unwrap_or(true);

    let wp_payload = match verify_wordpress_token(
        state.config.wordpress_jwt_secret.as_deref(),
        &payload.wordpress_token,
    ) {
        Ok(p) => p,
        Err(WordPressTokenError::NotConfigured) => {
            error!("wordpress-login requested but WORDPRESS_JWT_SECRET is not configured");
            return Err(ApiError::unauthorized(WP_VALIDATION_FAILED));
        }
        Err(reason) => {
            warn!(%reason, "wordpress token rejected");
            return Err(ApiError::unauthorized(WP_VALIDATION_FAILED));
        }
    };

    let email = extract_email(&wp_payload).map_err(|reason| {
        warn!(%reason, "wordpress token rejected");
        ApiError::unauthorized(WP_VALIDATION_FAILED)
    })?;

    info!(email = %email, "wordpress jwt validated");

    let (user, is_new) = match User::find_by_email(&state.db, &email).await? {
        // Existing row wins: role and identity come from the store, the
        // external token never grants more than what is already there.
        Some(user) => (user, false),
        None if auto_register => {
            info!(email = %email, "creating user from wordpress jwt");
            match User::create(
                &state.db,
                &email,
                "",
                Some(local_part(&email)),
                Role::User,
            )
            .await
            {
                Ok(user) => (user, true),
                // Lost the provisioning race; the row exists now, use it.
                Err(e) if is_unique_violation(&e) => {
                    let user = User::find_by_email(&state.db, &email)
                        .await?
                        .ok_or_else(|| ApiError::internal("An unexpected error occurred"))?;
                    (user, false)
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => {
            return Err(ApiError::not_found(
                "User not found. Set autoRegister=true to create a new user.",
            ))
        }
    };

    if !user.is_active {
        warn!(user_id = user.id, "wordpress exchange for deactivated account");
        return Err(ApiError::forbidden(ACCOUNT_DEACTIVATED));
    }

    let keys = JwtKeys::from_ref(&state);
    let (token, refresh_token) = issue_pair(&keys, &user)?;

    info!(user_id = user.id, is_new, "wordpress exchange complete");
    Ok(Json(WordPressAuthResponse {
        user: WordPressUserView {
            user: PublicUser::from(&user),
            is_new,
        },
        token,
        refresh_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|reason| {
        warn!(%reason, "refresh token rejected");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    // Re-resolve against the store: the new pair carries the current role,
    // and a deleted user cannot keep refreshing.
    let user = match User::find_by_id(&state.db, claims.user_id).await? {
        Some(user) => user,
        None => {
            warn!(user_id = claims.user_id, "refresh for deleted user");
            return Err(ApiError::unauthorized("User not found"));
        }
    };

    if !user.is_active {
        warn!(user_id = user.id, "refresh for deactivated account");
        return Err(ApiError::forbidden(ACCOUNT_DEACTIVATED));
    }

    let (token, refresh_token) = issue_pair(&keys, &user)?;
    Ok(Json(TokenPairResponse {
        token,
        refresh_token,
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = User::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = identity.user_id, "token for deleted user");
            ApiError::not_found("User not found")
        })?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        created_at: user.created_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // Shape check first; the store is not consulted for an invalid request.
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        warn!(user_id = identity.user_id, "new password too short");
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let user = User::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let ok = verify_password(payload.current_password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(error = %e, "verify_password failed");
            ApiError::internal("Failed to verify password")
        })?;

    if !ok {
        warn!(user_id = user.id, "change-password with wrong current password");
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let hash = hash_password(payload.new_password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::internal("Failed to process password")
    })?;

    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password changed successfully".into(),
    }))
}

#[instrument]
pub async fn logout(AuthUser(identity): AuthUser) -> Json<MessageResponse> {
    // Tokens are self-contained; logout is a client-side discard.
    info!(user_id = identity.user_id, "user logged out");
    Json(MessageResponse {
        message: "Logged out successfully. Please discard your tokens.".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("no domain@example.com"));
        assert!(!is_valid_email("trailing@dotless"));
    }

    #[test]
    fn wordpress_name_is_the_local_part() {
        assert_eq!(local_part("wpuser@example.com"), "wpuser");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }
}
