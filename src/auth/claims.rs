use serde::{Deserialize, Serialize};

/// User role as stored in the `users.role` column and embedded in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Type of JWT: access or refresh. Bearer extractors accept only `access`;
/// the refresh flow requires `refresh`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload for first-party tokens. Identity claims reflect the user row
/// at issuance time; staleness is bounded only by `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub kind: TokenKind,
}

/// Verified identity attached to a request by the bearer extractors.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn claims_use_user_id_wire_name() {
        let claims = Claims {
            user_id: 42,
            email: "alice@example.com".into(),
            role: Role::User,
            iat: 0,
            exp: 0,
            iss: "dbrosetta-api".into(),
            kind: TokenKind::Access,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], 42);
        assert_eq!(json["kind"], "access");
    }
}
