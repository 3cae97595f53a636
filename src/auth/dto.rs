use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::{claims::Role, repo::User};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the WordPress token exchange.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPressLoginRequest {
    pub wordpress_token: String,
    /// Defaults to true: unknown emails are provisioned just in time.
    pub auto_register: Option<bool>,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Response for register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
    pub refresh_token: String,
}

/// User view in the exchange response; `isNew` reports JIT provisioning.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPressUserView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub is_new: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPressAuthResponse {
    pub user: WordPressUserView,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_uses_camel_case_and_hides_digest() {
        let user = User {
            id: 1,
            email: "alice@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: Some("Alice".into()),
            role: Role::User,
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let response = AuthResponse {
            user: PublicUser::from(&user),
            token: "t".into(),
            refresh_token: "r".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["user"]["role"], "user");
        assert!(json["user"].get("passwordHash").is_none());
        assert!(!serde_json::to_string(&response).unwrap().contains("argon2"));
    }

    #[test]
    fn wordpress_view_flattens_user_with_is_new() {
        let user = User {
            id: 5,
            email: "wp@example.com".into(),
            password_hash: String::new(),
            name: Some("wp".into()),
            role: Role::Admin,
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let view = WordPressUserView {
            user: PublicUser::from(&user),
            is_new: false,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["isNew"], false);
        assert_eq!(json["email"], "wp@example.com");
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn wordpress_request_defaults_auto_register_to_none() {
        let req: WordPressLoginRequest =
            serde_json::from_str(r#"{"wordpressToken": "abc"}"#).unwrap();
        assert_eq!(req.wordpress_token, "abc");
        assert!(req.auto_register.is_none());
    }
}
