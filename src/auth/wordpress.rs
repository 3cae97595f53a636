use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::warn;

/// Failures of the external trust boundary. Callers flatten these into a
/// generic 401 on the wire; the variant is for server-side logs.
#[derive(Debug, thiserror::Error)]
pub enum WordPressTokenError {
    #[error("WORDPRESS_JWT_SECRET is not configured")]
    NotConfigured,
    #[error("WordPress token has expired")]
    Expired,
    #[error("invalid WordPress token: {0}")]
    Invalid(&'static str),
    #[error("email not found in WordPress token")]
    MissingEmail,
}

/// WordPress JWT plugins nest the identity under `data.user` and disagree on
/// the email field name. Everything is optional so a structurally wrong
/// payload decodes and is rejected explicitly rather than as a JSON error.
#[derive(Debug, Deserialize)]
pub struct WordPressPayload {
    pub data: Option<WordPressData>,
    #[allow(dead_code)]
    pub iat: Option<usize>,
    #[allow(dead_code)]
    pub exp: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WordPressData {
    pub user: Option<WordPressUser>,
}

#[derive(Debug, Deserialize)]
pub struct WordPressUser {
    #[allow(dead_code)]
    pub id: Option<serde_json::Value>,
    pub email: Option<String>,
    pub user_email: Option<String>,
}

/// Verify an externally-issued WordPress JWT against the dedicated shared
/// secret. Only HS256 is accepted; any other algorithm, a wrong signature or
/// a payload without `data.user` is rejected.
pub fn verify_wordpress_token(
    secret: Option<&str>,
    token: &str,
) -> Result<WordPressPayload, WordPressTokenError> {
    let secret = secret.ok_or(WordPressTokenError::NotConfigured)?;

    let validation = Validation::new(Algorithm::HS256);
    let decoding = DecodingKey::from_secret(secret.as_bytes());

    let data = decode::<WordPressPayload>(token, &decoding, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => WordPressTokenError::Expired,
            _ => {
                warn!(error = %e, "wordpress jwt verification failed");
                WordPressTokenError::Invalid("bad signature or malformed token")
            }
        }
    })?;

    let payload = data.claims;
    match &payload.data {
        Some(data) if data.user.is_some() => Ok(payload),
        _ => Err(WordPressTokenError::Invalid("missing user data")),
    }
}

/// Pull the email out of a verified payload, accepting either of the two
/// field names plugins use. Requires an `@` and at least 3 characters.
pub fn extract_email(payload: &WordPressPayload) -> Result<String, WordPressTokenError> {
    let user = payload
        .data
        .as_ref()
        .and_then(|d| d.user.as_ref())
        .ok_or(WordPressTokenError::Invalid("missing user data"))?;

    let email = user
        .email
        .as_deref()
        .or(user.user_email.as_deref())
        .ok_or(WordPressTokenError::MissingEmail)?;

    if !email.contains('@') || email.len() < 3 {
        return Err(WordPressTokenError::MissingEmail);
    }

    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    const SECRET: &str = "wordpress-test-secret-key-min-32-chars";

    fn sign(payload: serde_json::Value, secret: &str, alg: Algorithm) -> String {
        encode(
            &Header::new(alg),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign test token")
    }

    fn wp_body(email_field: &str, email: &str, exp_offset_secs: i64) -> serde_json::Value {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        json!({
            "data": { "user": { "id": "123", email_field: email } },
            "iat": now,
            "exp": now + exp_offset_secs,
        })
    }

    #[test]
    fn accepts_valid_token_and_extracts_email() {
        let token = sign(wp_body("email", "wp@example.com", 3600), SECRET, Algorithm::HS256);
        let payload = verify_wordpress_token(Some(SECRET), &token).expect("verify");
        assert_eq!(extract_email(&payload).unwrap(), "wp@example.com");
    }

    #[test]
    fn accepts_user_email_field_name() {
        let token = sign(
            wp_body("user_email", "wp2@example.com", 3600),
            SECRET,
            Algorithm::HS256,
        );
        let payload = verify_wordpress_token(Some(SECRET), &token).expect("verify");
        assert_eq!(extract_email(&payload).unwrap(), "wp2@example.com");
    }

    #[test]
    fn fails_without_configured_secret() {
        let token = sign(wp_body("email", "wp@example.com", 3600), SECRET, Algorithm::HS256);
        assert!(matches!(
            verify_wordpress_token(None, &token),
            Err(WordPressTokenError::NotConfigured)
        ));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign(
            wp_body("email", "wp@example.com", 3600),
            "wrong-secret-key-that-does-not-match",
            Algorithm::HS256,
        );
        assert!(matches!(
            verify_wordpress_token(Some(SECRET), &token),
            Err(WordPressTokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unexpected_algorithm() {
        let token = sign(wp_body("email", "wp@example.com", 3600), SECRET, Algorithm::HS512);
        assert!(matches!(
            verify_wordpress_token(Some(SECRET), &token),
            Err(WordPressTokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign(wp_body("email", "wp@example.com", -3600), SECRET, Algorithm::HS256);
        assert!(matches!(
            verify_wordpress_token(Some(SECRET), &token),
            Err(WordPressTokenError::Expired)
        ));
    }

    #[test]
    fn rejects_payload_without_user_data() {
        let now = OffsetDateTime::now_utc();
        let token = sign(
            json!({
                "someOtherField": "value",
                "exp": (now + Duration::hours(1)).unix_timestamp(),
            }),
            SECRET,
            Algorithm::HS256,
        );
        assert!(matches!(
            verify_wordpress_token(Some(SECRET), &token),
            Err(WordPressTokenError::Invalid("missing user data"))
        ));
    }

    #[test]
    fn rejects_missing_or_implausible_email() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let token = sign(
            json!({
                "data": { "user": { "id": 9 } },
                "exp": now + 3600,
            }),
            SECRET,
            Algorithm::HS256,
        );
        let payload = verify_wordpress_token(Some(SECRET), &token).expect("verify");
        assert!(matches!(
            extract_email(&payload),
            Err(WordPressTokenError::MissingEmail)
        ));

        let token = sign(wp_body("email", "no-at-sign", 3600), SECRET, Algorithm::HS256);
        let payload = verify_wordpress_token(Some(SECRET), &token).expect("verify");
        assert!(matches!(
            extract_email(&payload),
            Err(WordPressTokenError::MissingEmail)
        ));
    }
}
