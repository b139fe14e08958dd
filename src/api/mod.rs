//! HTTP surface: the `/api/...` routes over the repositories.

pub mod auth;
pub mod catalog;
pub mod collections;
pub mod favorites;
pub mod orders;
pub mod users;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::kv::{KvStore, RestKv};
use crate::repository::Repositories;

pub use auth::{Admin, AuthKeys, AuthUser, Claims};

#[derive(Clone)]
pub struct AppState {
    /// `None` when the KV store is not configured.
    pub repos: Option<Arc<Repositories>>,
    pub auth: Arc<AuthKeys>,
}

impl AppState {
    pub fn new(kv: Option<Arc<dyn KvStore>>, auth: AuthKeys) -> Self {
        Self { repos: kv.map(|kv| Arc::new(Repositories::new(kv))), auth: Arc::new(auth) }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let kv: Option<Arc<dyn KvStore>> = match &config.kv {
            Some(creds) => Some(Arc::new(RestKv::new(&creds.url, creds.token.clone())?)),
            None => None,
        };
        Ok(Self::new(kv, AuthKeys::new(config.jwt_secret.clone(), config.admin_token.clone())))
    }

    pub fn repos(&self) -> Result<&Repositories> {
        self.repos.as_deref().ok_or(StoreError::NotConfigured)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "wallpaper-storefront"})) }))
        .merge(orders::routes())
        .merge(catalog::routes())
        .merge(favorites::routes())
        .merge(collections::routes())
        .merge(users::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::PublicUser;
    use crate::kv::MemoryKv;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    pub const ADMIN_TOKEN: &str = "test-admin-token";

    pub fn state() -> (Arc<MemoryKv>, AppState) {
        let kv = Arc::new(MemoryKv::new());
        let state = AppState::new(Some(kv.clone()), AuthKeys::new("test-secret", ADMIN_TOKEN));
        (kv, state)
    }

    pub fn unconfigured() -> AppState {
        AppState::new(None, AuthKeys::new("test-secret", ADMIN_TOKEN))
    }

    pub fn user_token(state: &AppState, id: &str, is_admin: bool) -> String {
        let user = PublicUser {
            id: id.into(),
            email: format!("{id}@example.com"),
            name: id.into(),
            is_admin,
            created_at: chrono::Utc::now(),
        };
        state.auth.issue(&user).unwrap()
    }

    pub async fn call(state: &AppState, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req.header("Content-Type", "application/json").body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        let res = router(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
