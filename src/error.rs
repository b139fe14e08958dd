//! Error taxonomy for the server routes and the client stores.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::kv::KvError;

/// Errors surfaced by repositories and API routes.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Base de datos no configurada")]
    NotConfigured,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Kv(#[from] KvError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Kv(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<JsonRejection> for StoreError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::Validation(e.body_text()),
            other => Self::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "request failed");
        }
        let mut body = serde_json::json!({ "success": false, "error": self.to_string() });
        if matches!(self, Self::NotConfigured) {
            body["needsConfig"] = serde_json::Value::Bool(true);
        }
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the client stores. `Display` is the user-facing message.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Tiempo de espera agotado. El servidor no respondió a tiempo.")]
    Timeout,

    #[error("Error de conexión: {0}")]
    Connection(String),

    #[error("Error del servidor ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Base de datos no configurada. Configura KV_REST_API_URL y KV_REST_API_TOKEN.")]
    NotConfigured,

    #[error("No autorizado: {0}")]
    Unauthorized(String),

    #[error("No encontrado: {0}")]
    NotFound(String),

    #[error("API no configurada")]
    NoApi,

    #[error("Datos inválidos: {0}")]
    Invalid(String),

    #[error("Almacenamiento local: {0}")]
    Cache(#[from] std::io::Error),

    #[error("Respuesta inválida: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Verification(#[from] VerificationError),
}

impl ClientError {
    /// Maps a non-2xx API response to the matching client error.
    pub fn from_status(status: u16, message: String, needs_config: bool) -> Self {
        if needs_config || status == 503 {
            return Self::NotConfigured;
        }
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            _ => Self::Server { status, message },
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Invalid(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Connection(e.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No hay verificación pendiente")]
    NothingPending,
    #[error("El código ha expirado")]
    Expired,
    #[error("Código incorrecto")]
    WrongCode,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
