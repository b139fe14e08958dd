use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::{Admin, AppState};
use crate::domain::{default_collections, Collection};
use crate::error::{Result, StoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/collections/get", get(get_collections))
        .route("/api/collections/update", post(update_collections))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCollectionsRequest { pub collections: Vec<Collection> }

async fn get_collections(State(s): State<AppState>) -> Json<Value> {
    let now = chrono::Utc::now().timestamp_millis();
    let Some(repos) = &s.repos else {
        return Json(json!({ "success": true, "collections": default_collections(), "timestamp": now, "needsConfig": true }));
    };
    match repos.collections.get().await {
        Ok(Some(collections)) => Json(json!({ "success": true, "collections": collections, "timestamp": now })),
        Ok(None) => Json(json!({ "success": true, "collections": default_collections(), "timestamp": now })),
        Err(e) => {
            error!(error = %e, "collections read failed; serving defaults");
            Json(json!({ "success": true, "collections": default_collections(), "timestamp": now, "fallback": true }))
        }
    }
}

async fn update_collections(
    State(s): State<AppState>,
    _: Admin,
    payload: std::result::Result<Json<UpdateCollectionsRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let repos = s.repos()?;
    let Json(req) = payload?;
    if let Some(bad) = req.collections.iter().find(|c| c.name.trim().is_empty() || c.name.len() > 100) {
        return Err(StoreError::Validation(format!("Nombre de colección inválido: '{}'", bad.id)));
    }
    repos.collections.save(&req.collections).await?;
    Ok(Json(json!({ "success": true, "count": req.collections.len() })))
}
