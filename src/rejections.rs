use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Request-level failure, rendered as a JSON `{"error": ...}` payload.
#[derive(Debug)]
pub enum AppError {
    /// The client sent something unusable (missing or invalid field).
    Input(&'static str),
    NotFound(&'static str),
    /// No session credential on an admin route.
    AuthRequired,
    /// Credential present but invalid, expired, or missing the admin role.
    Unauthorized,
    /// Upstream data-store failure; carries the upstream message.
    Database(String),
    Internal(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AppError::Input(m) => (StatusCode::BAD_REQUEST, m.to_string()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.to_string()),
            AppError::AuthRequired => {
                (StatusCode::UNAUTHORIZED, "authentication required".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::Database(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.to_string()),
        };
        (code, Json(json!({ "error": message }))).into_response()
    }
}

pub trait ResultExt<T> {
    /// Log the error with context and surface the upstream message to the
    /// caller as a server error.
    fn reject(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for color_eyre::Result<T> {
    fn reject(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{context}: {e}");
            AppError::Database(e.to_string())
        })
    }
}
