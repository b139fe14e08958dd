use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{Admin, AppState, AuthUser};
use crate::domain::NewOrder;
use crate::error::{Result, StoreError};
use crate::repository::OrderScope;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders/create", post(create_order))
        .route("/api/orders/update", post(update_order))
        .route("/api/orders/delete", post(delete_order))
        .route("/api/orders/get", get(my_orders))
        .route("/api/orders/list", get(list_orders))
        .route("/api/orders/reindex", post(reindex))
        .route("/api/orders/:id", get(get_order).patch(patch_order))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest { pub order: Option<Value> }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest { pub order_id: String, pub updates: Map<String, Value> }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderRequest { pub order_id: String }

async fn create_order(
    State(s): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let raw = req.order.ok_or_else(|| StoreError::BadRequest("Order data required".into()))?;
    let repos = s.repos()?;
    let new: NewOrder = serde_json::from_value(raw).map_err(|e| StoreError::Validation(e.to_string()))?;
    if new.user_id != claims.sub && !claims.is_admin {
        return Err(StoreError::Forbidden("No puedes crear pedidos para otro usuario".into()));
    }
    let order = repos.orders.create(new).await?;
    Ok(Json(json!({ "success": true, "orderId": order.id, "order": order })))
}

async fn update_order(
    State(s): State<AppState>,
    _: Admin,
    payload: std::result::Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let order = s.repos()?.orders.update(&req.order_id, &req.updates).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn delete_order(
    State(s): State<AppState>,
    _: Admin,
    payload: std::result::Result<Json<DeleteOrderRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let existed = s.repos()?.orders.delete(&req.order_id).await?;
    Ok(Json(json!({ "success": true, "orderId": req.order_id, "existed": existed })))
}

async fn my_orders(State(s): State<AppState>, AuthUser(claims): AuthUser) -> Result<Json<Value>> {
    let orders = s.repos()?.orders.list(OrderScope::User(claims.sub)).await?;
    Ok(Json(json!({ "success": true, "count": orders.len(), "orders": orders })))
}

async fn list_orders(State(s): State<AppState>, _: Admin) -> Result<Json<Value>> {
    let orders = s.repos()?.orders.list(OrderScope::All).await?;
    Ok(Json(json!({ "success": true, "count": orders.len(), "orders": orders })))
}

async fn reindex(State(s): State<AppState>, _: Admin) -> Result<Json<Value>> {
    let report = s.repos()?.orders.reconcile().await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

async fn get_order(State(s): State<AppState>, _: Admin, Path(id): Path<String>) -> Result<Json<Value>> {
    let order = s.repos()?.orders.get(&id).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

async fn patch_order(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(updates) = payload?;
    let order = s.repos()?.orders.update(&id, &updates).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}
