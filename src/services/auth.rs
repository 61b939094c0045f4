use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use zeroize::Zeroize;

use crate::error::{AppError, Result};
use crate::repositories::user as user_repo;

/// The identity a successful credential check resolves to.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The user's unique identifier.
    pub id: i32,
    /// The user's display name.
    pub name: String,
}

/// The credential-store capability: resolve an (identifier, secret) pair to
/// at most one principal.
///
/// Injected behind a trait, like the session store, so the PostgreSQL-backed
/// implementation can be swapped without touching the login handler.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolves a submitted credential pair to a principal.
    ///
    /// # Arguments
    ///
    /// * `username` - The submitted identifier, forwarded opaquely.
    /// * `password` - The submitted secret, forwarded opaquely.
    ///
    /// # Returns
    ///
    /// `Ok(None)` for both an unknown identifier and a wrong secret, so
    /// callers cannot distinguish the two. Only a store fault is an error.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>>;
}

/// The production credential store, backed by the PostgreSQL `users` table.
pub struct PostgresCredentialStore {
    db: Pool,
}

impl PostgresCredentialStore {
    /// Creates a new `PostgresCredentialStore` on top of an existing pool.
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}

/// Verifies a password against a stored Argon2 PHC hash.
///
/// # Arguments
///
/// * `password` - The password to verify.
/// * `hash` - The stored PHC hash to verify against.
///
/// # Returns
///
/// A `Result` containing `true` if the password matches. A hash that fails
/// to parse is a store fault, not a wrong password: surfacing it as "invalid
/// credentials" would hide data corruption.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>> {
        tracing::debug!("🔐 Authenticating user: {}", username);

        let Some(user) = user_repo::find_by_email(&self.db, username).await? else {
            tracing::debug!("Unknown user: {}", username);
            return Ok(None);
        };

        if !verify_password(password, &user.password)? {
            tracing::debug!("Wrong password for user: {}", user.id);
            return Ok(None);
        }

        tracing::info!("✅ User authenticated: {}", user.id);

        Ok(Some(Principal {
            id: user.id,
            name: user.name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn verify_accepts_the_right_password_only() {
        let stored = hash("p");
        assert!(verify_password("p", &stored).unwrap());
        assert!(!verify_password("not-p", &stored).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_a_fault_not_a_mismatch() {
        assert!(verify_password("p", "plaintext-from-a-legacy-row").is_err());
    }
}
