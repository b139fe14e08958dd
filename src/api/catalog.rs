use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Admin, AppState};
use crate::domain::{default_catalog, Wallpaper, WallpaperSummary};
use crate::error::{Result, StoreError};
use crate::repository::CatalogSource;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/get", get(get_catalog))
        .route("/api/catalog/update", post(update_catalog))
        .route("/api/catalog/reset", post(reset_catalog))
        .route("/api/products/get", get(get_product))
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub collection: Option<String>,
    #[serde(default)]
    pub lite: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CatalogItems {
    Full(Vec<Wallpaper>),
    Lite(Vec<WallpaperSummary>),
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery { pub id: Option<String> }

#[derive(Debug, Deserialize)]
pub struct UpdateCatalogRequest { pub catalog: Vec<Wallpaper> }

async fn get_catalog(State(s): State<AppState>, Query(q): Query<CatalogQuery>) -> Json<Value> {
    let (mut items, source) = match &s.repos {
        Some(repos) => repos.catalog.fetch().await,
        None => (default_catalog(), CatalogSource::Fallback),
    };
    if let Some(collection) = q.collection.as_deref().filter(|c| !c.is_empty()) {
        items.retain(|w| w.in_collection(collection));
    }
    let count = items.len();
    let items = if q.lite.as_deref() == Some("true") {
        CatalogItems::Lite(items.iter().map(Wallpaper::summary).collect())
    } else {
        CatalogItems::Full(items)
    };
    Json(json!({
        "success": true,
        "catalog": items,
        "count": count,
        "usingKv": s.repos.is_some() && source != CatalogSource::Fallback,
        "source": source,
        "timestamp": chrono::Utc::now().timestamp_millis(),
    }))
}

/// One item by id, for detail views that should not pull the whole catalog.
async fn get_product(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> Result<Json<Value>> {
    let id = q.id.filter(|id| !id.trim().is_empty()).ok_or_else(|| StoreError::BadRequest("Falta el ID del producto".into()))?;
    let catalog = s.repos()?.catalog.load().await?.unwrap_or_default();
    let product = catalog
        .into_iter()
        .find(|w| w.id == id.trim())
        .ok_or_else(|| StoreError::NotFound("Producto no encontrado".into()))?;
    Ok(Json(json!({ "success": true, "product": product })))
}

async fn update_catalog(
    State(s): State<AppState>,
    _: Admin,
    payload: std::result::Result<Json<UpdateCatalogRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let repos = s.repos()?;
    let Json(req) = payload?;
    let count = repos.catalog.save(req.catalog).await?;
    Ok(Json(json!({ "success": true, "count": count })))
}

async fn reset_catalog(State(s): State<AppState>, _: Admin) -> Result<Json<Value>> {
    let catalog = s.repos()?.catalog.reset().await?;
    Ok(Json(json!({ "success": true, "count": catalog.len(), "catalog": catalog })))
}
