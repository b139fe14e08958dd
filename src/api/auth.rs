//! Bearer authentication for the API routes
//!
//! Users carry an HS256 JWT issued at login. Admin routes also accept the
//! shared admin token configured on the server.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::PublicUser;
use crate::error::{Result, StoreError};

const JWT_EXPIRY_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize,
    pub iat: usize,
}

pub struct AuthKeys {
    jwt_secret: String,
    admin_token: String,
}

impl AuthKeys {
    pub fn new(jwt_secret: impl Into<String>, admin_token: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), admin_token: admin_token.into() }
    }

    pub fn issue(&self, user: &PublicUser) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            exp: (now + chrono::Duration::days(JWT_EXPIRY_DAYS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(self.jwt_secret.as_bytes()))
            .map_err(|e| StoreError::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(self.jwt_secret.as_bytes()), &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {e}");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        StoreError::Unauthorized("Token expirado - Por favor inicia sesión nuevamente".into())
                    }
                    _ => StoreError::Unauthorized("Token inválido".into()),
                }
            })
    }

    pub fn is_admin_token(&self, token: &str) -> bool { !self.admin_token.is_empty() && token == self.admin_token }
}

fn bearer(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StoreError::Unauthorized("No autorizado - Token no proporcionado".into()))?;
    Ok(header.strip_prefix("Bearer ").unwrap_or(header).trim())
}

/// A signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        state.auth.verify(bearer(parts)?).map(AuthUser)
    }
}

/// Either the shared admin token or a JWT whose user is an admin.
#[derive(Debug, Clone)]
pub struct Admin;

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer(parts)?;
        if state.auth.is_admin_token(token) {
            return Ok(Admin);
        }
        let claims = state.auth.verify(token)?;
        if !claims.is_admin {
            return Err(StoreError::Forbidden("Acceso denegado - Se requieren permisos de administrador".into()));
        }
        Ok(Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_admin: bool) -> PublicUser {
        PublicUser { id: "1".into(), email: "a@b.co".into(), name: "A".into(), is_admin, created_at: Utc::now() }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = AuthKeys::new("secret", "admin");
        let token = keys.issue(&user(true)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "1");
        assert!(claims.is_admin);
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = AuthKeys::new("other", "admin").issue(&user(false)).unwrap();
        assert!(matches!(AuthKeys::new("secret", "admin").verify(&token), Err(StoreError::Unauthorized(_))));
    }

    #[test]
    fn test_admin_token_match() {
        let keys = AuthKeys::new("secret", "admin");
        assert!(keys.is_admin_token("admin"));
        assert!(!keys.is_admin_token("Admin"));
        assert!(!AuthKeys::new("secret", "").is_admin_token(""));
    }
}
