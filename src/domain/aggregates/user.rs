//! Storefront accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stored account record. Only ever leaves the server as [`PublicUser`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for PublicUser {
    fn from(u: &UserRecord) -> Self {
        Self { id: u.id.clone(), email: u.email.clone(), name: u.name.clone(), is_admin: u.is_admin, created_at: u.created_at }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Registration {
    #[validate(email(message = "Email inválido"), length(min = 3, max = 255))]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "El nombre es requerido"))]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "La contraseña es requerida"))]
    pub password: String,
}

pub fn user_key(email: &str) -> String { format!("user:{}", email.trim().to_lowercase()) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_rules() {
        let ok = Registration { email: "a@b.co".into(), password: "secret1".into(), name: "Ana".into() };
        assert!(ok.validate().is_ok());
        let short = Registration { password: "123".into(), ..ok.clone() };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_user_key_is_case_insensitive() {
        assert_eq!(user_key(" Ana@Example.com "), "user:ana@example.com");
    }
}
