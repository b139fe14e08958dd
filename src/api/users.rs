use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::domain::{Credentials, Registration};
use crate::error::{Result, StoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/make-admin", post(make_admin))
        .route("/api/verification-send", post(send_verification))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeAdminRequest {
    pub email: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

/// Accepts a freshly issued registration code for delivery. Nothing is
/// stored: the code lives with the client until it is verified.
async fn send_verification(payload: std::result::Result<Json<VerificationRequest>, JsonRejection>) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let (Some(email), Some(code)) = (req.email.filter(|e| !e.trim().is_empty()), req.code) else {
        return Err(StoreError::BadRequest("Email y código son requeridos".into()));
    };
    if !validator::validate_email(email.trim()) {
        return Err(StoreError::Validation("Email inválido".into()));
    }
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(StoreError::Validation("Código inválido".into()));
    }
    info!(email = %email.trim(), "verification code issued");
    Ok(Json(json!({ "success": true, "message": "Código enviado" })))
}

async fn register(
    State(s): State<AppState>,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(registration) = payload?;
    let user = s.repos()?.users.register(registration).await?;
    let token = s.auth.issue(&user)?;
    Ok(Json(json!({ "success": true, "user": user, "token": token })))
}

async fn login(
    State(s): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(credentials) = payload?;
    let user = s.repos()?.users.authenticate(credentials).await?;
    let token = s.auth.issue(&user)?;
    Ok(Json(json!({ "success": true, "user": user, "token": token })))
}

async fn make_admin(
    State(s): State<AppState>,
    payload: std::result::Result<Json<MakeAdminRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    if !req.secret_key.as_deref().is_some_and(|k| s.auth.is_admin_token(k)) {
        return Err(StoreError::Forbidden("Acceso denegado".into()));
    }
    let email = req.email.filter(|e| !e.trim().is_empty()).ok_or_else(|| StoreError::BadRequest("Email requerido".into()))?;
    let user = s.repos()?.users.set_admin(&email, true).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_register_login_and_promote() {
        let (_, state) = state();
        let reg = json!({"email": "ana@example.com", "password": "secret1", "name": "Ana"});
        let (status, body) = call(&state, "POST", "/api/users/register", None, Some(reg.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["user"].get("passwordHash").is_none());
        let token = body["token"].as_str().unwrap().to_string();
        let (status, _) = call(&state, "GET", "/api/orders/get", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&state, "POST", "/api/users/register", None, Some(reg)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let creds = json!({"email": "ana@example.com", "password": "secret1"});
        let (status, body) = call(&state, "POST", "/api/users/login", None, Some(creds.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        let (status, _) = call(&state, "GET", "/api/orders/list", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let promote = json!({"email": "ana@example.com", "secretKey": "wrong"});
        let (status, _) = call(&state, "POST", "/api/users/make-admin", None, Some(promote)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let promote = json!({"email": "ana@example.com", "secretKey": ADMIN_TOKEN});
        let (status, _) = call(&state, "POST", "/api/users/make-admin", None, Some(promote)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&state, "POST", "/api/users/login", None, Some(creds)).await;
        let token = body["token"].as_str().unwrap().to_string();
        let (status, _) = call(&state, "GET", "/api/orders/list", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_verification_send_checks_input() {
        let state = unconfigured();
        let (status, _) = call(&state, "POST", "/api/verification-send", None, Some(json!({"email": "ana@example.com"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json!({"email": "ana@example.com", "code": "12ab"});
        let (status, _) = call(&state, "POST", "/api/verification-send", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json!({"email": "ana@example.com", "code": "123456"});
        let (status, res) = call(&state, "POST", "/api/verification-send", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["success"], true);
    }

    #[tokio::test]
    async fn test_bad_credentials_and_input() {
        let (_, state) = state();
        let creds = json!({"email": "nobody@example.com", "password": "x"});
        let (status, body) = call(&state, "POST", "/api/users/login", None, Some(creds)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let reg = json!({"email": "not-an-email", "password": "secret1", "name": "Ana"});
        let (status, _) = call(&state, "POST", "/api/users/register", None, Some(reg)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
