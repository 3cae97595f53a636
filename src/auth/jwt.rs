use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    auth::claims::{Claims, Identity, TokenKind},
    config::JwtConfig,
    state::AppState,
};

/// Verification failure, split so server logs can keep the reason while the
/// HTTP boundary stays generic.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Signing and verification keys plus the issuance parameters, derived once
/// from config and threaded through handlers.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            access_ttl: Duration::from_secs((cfg.access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes as u64) * 60),
        }
    }

    fn sign_with_kind(&self, identity: &Identity, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            role: identity.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = identity.user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, identity: &Identity) -> anyhow::Result<String> {
        self.sign_with_kind(identity, TokenKind::Access)
    }

    pub fn sign_refresh(&self, identity: &Identity) -> anyhow::Result<String> {
        self.sign_with_kind(identity, TokenKind::Refresh)
    }

    /// Verify signature, expiry and issuer. HS256 is the only accepted
    /// algorithm; everything but expiry collapses into `Invalid`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    warn!(error = %e, "jwt verification failed");
                    TokenError::Invalid
                }
            }
        })?;
        debug!(user_id = data.claims.user_id, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            warn!(user_id = claims.user_id, "refresh flow given a non-refresh token");
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use crate::config::JwtConfig;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-test-secret-test-secret!".into(),
            issuer: "test-issuer".into(),
            access_ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        }
    }

    fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&test_config())
    }

    fn alice() -> Identity {
        Identity {
            user_id: 7,
            email: "alice@example.com".into(),
            role: Role::User,
        }
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(&alice()).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let token = keys.sign_refresh(&alice()).expect("sign refresh");
        let claims = keys.verify_refresh(&token).expect("verify refresh");
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(&alice()).expect("sign access");
        assert_eq!(keys.verify_refresh(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let mut other_cfg = test_config();
        other_cfg.secret = "another-secret-another-secret-32ch!!".into();
        let other = JwtKeys::from_config(&other_cfg);
        let token = other.sign_access(&alice()).expect("sign access");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn verify_rejects_wrong_issuer() {
        let keys = make_keys();
        let mut other_cfg = test_config();
        other_cfg.issuer = "someone-else".into();
        let other = JwtKeys::from_config(&other_cfg);
        let token = other.sign_access(&alice()).expect("sign access");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn verify_rejects_other_algorithms() {
        let cfg = test_config();
        let keys = JwtKeys::from_config(&cfg);
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            user_id: 7,
            email: "alice@example.com".into(),
            role: Role::User,
            iat: now,
            exp: now + 300,
            iss: cfg.issuer.clone(),
            kind: TokenKind::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .expect("sign hs384");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let cfg = test_config();
        let keys = JwtKeys::from_config(&cfg);
        let past = (OffsetDateTime::now_utc() - TimeDuration::hours(2)).unix_timestamp() as usize;
        let claims = Claims {
            user_id: 7,
            email: "alice@example.com".into(),
            role: Role::User,
            iat: past,
            exp: past + 60,
            iss: cfg.issuer.clone(),
            kind: TokenKind::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .expect("sign expired");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), TokenError::Invalid);
    }
}
