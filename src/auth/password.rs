use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password_sync(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password_sync(plain: &str, digest: &str) -> anyhow::Result<bool> {
    // WordPress-provisioned users carry an empty digest and must never
    // verify against any plaintext.
    if digest.trim().is_empty() {
        return Ok(false);
    }
    let parsed = PasswordHash::new(digest).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Hash on the blocking pool so the KDF cost never stalls the request loop.
pub async fn hash_password(plain: String) -> anyhow::Result<String> {
    let digest = tokio::task::spawn_blocking(move || hash_password_sync(&plain)).await??;
    Ok(digest)
}

pub async fn verify_password(plain: String, digest: String) -> anyhow::Result<bool> {
    let ok = tokio::task::spawn_blocking(move || verify_password_sync(&plain, &digest)).await??;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password_sync(password).expect("hashing should succeed");
        assert!(verify_password_sync(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password_sync(password).expect("hashing should succeed");
        assert!(!verify_password_sync("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn empty_digest_never_verifies() {
        assert!(!verify_password_sync("anything", "").unwrap());
        assert!(!verify_password_sync("", "").unwrap());
        assert!(!verify_password_sync("anything", "   ").unwrap());
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password_sync("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn async_wrappers_agree_with_sync() {
        let hash = hash_password("offloaded-password".to_string())
            .await
            .expect("hash");
        assert!(verify_password("offloaded-password".to_string(), hash.clone())
            .await
            .expect("verify"));
        assert!(!verify_password("other".to_string(), hash).await.expect("verify"));
    }
}
