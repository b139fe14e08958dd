//! Accounts stored at `user:<email>` with argon2 password hashes.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use tracing::{debug, error, info};
use validator::Validate;

use crate::domain::user::user_key;
use crate::domain::value_objects::OrderIdGenerator;
use crate::domain::{Credentials, PublicUser, Registration, UserRecord};
use crate::error::{Result, StoreError};
use crate::kv::{KvStore, KvStoreExt};

pub struct UserRepository {
    kv: Arc<dyn KvStore>,
    ids: OrderIdGenerator,
}

impl UserRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self { Self { kv, ids: OrderIdGenerator::new() } }

    pub async fn register(&self, registration: Registration) -> Result<PublicUser> {
        registration.validate()?;
        let key = user_key(&registration.email);
        if self.kv.get(&key).await?.is_some() {
            return Err(StoreError::BadRequest("Este correo ya está registrado".into()));
        }
        let record = UserRecord {
            id: self.ids.next(),
            email: registration.email.trim().to_lowercase(),
            name: registration.name.trim().to_string(),
            password_hash: hash_password(&registration.password)?,
            is_admin: false,
            created_at: Utc::now(),
        };
        self.kv.set_json(&key, &record).await?;
        info!(user_id = %record.id, "user registered");
        Ok(PublicUser::from(&record))
    }

    /// The same error is returned for an unknown email and a wrong password.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<PublicUser> {
        credentials.validate()?;
        let invalid = || StoreError::Unauthorized("Credenciales inválidas".into());
        let record = self
            .kv
            .get_json::<UserRecord>(&user_key(&credentials.email))
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(&record.password_hash, &credentials.password)? {
            debug!(user_id = %record.id, "password mismatch");
            return Err(invalid());
        }
        Ok(PublicUser::from(&record))
    }

    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<PublicUser> {
        let key = user_key(email);
        let mut record = self
            .kv
            .get_json::<UserRecord>(&key)
            .await?
            .ok_or_else(|| StoreError::NotFound("Usuario no encontrado".into()))?;
        record.is_admin = is_admin;
        self.kv.set_json(&key, &record).await?;
        info!(user_id = %record.id, is_admin, "admin flag changed");
        Ok(PublicUser::from(&record))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            StoreError::Internal(format!("password hashing failed: {e}"))
        })
}

fn verify_password(stored: &str, provided: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| StoreError::Internal(format!("invalid stored hash: {e}")))?;
    match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StoreError::Internal(format!("password verification failed: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn registration() -> Registration {
        Registration { email: "Ana@Example.com".into(), password: "secret1".into(), name: "Ana".into() }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let kv = Arc::new(MemoryKv::new());
        let repo = UserRepository::new(kv.clone());
        let user = repo.register(registration()).await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert!(!kv.raw("user:ana@example.com").unwrap().contains("secret1"));

        let ok = repo.authenticate(Credentials { email: "ana@example.com".into(), password: "secret1".into() }).await;
        assert_eq!(ok.unwrap().id, user.id);
        let bad = repo.authenticate(Credentials { email: "ana@example.com".into(), password: "nope".into() }).await;
        assert!(matches!(bad, Err(StoreError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = UserRepository::new(Arc::new(MemoryKv::new()));
        repo.register(registration()).await.unwrap();
        assert!(matches!(repo.register(registration()).await, Err(StoreError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_set_admin() {
        let repo = UserRepository::new(Arc::new(MemoryKv::new()));
        repo.register(registration()).await.unwrap();
        assert!(repo.set_admin("ana@example.com", true).await.unwrap().is_admin);
        assert!(matches!(repo.set_admin("x@y.z", true).await, Err(StoreError::NotFound(_))));
    }
}
