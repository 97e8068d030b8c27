// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request: malformed or missing payload parts
    BadRequest(String),

    // 500: required configuration (credentials, table names) is absent.
    // The user-facing message stays generic; the detail is only logged.
    Config(String),

    // 500: Airtable rejected or failed a call. Carries the upstream
    // message so the client can surface it.
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON `{message}` response with the
/// appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Config(detail) => {
                tracing::error!("Configuration error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration serveur manquante.".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream store error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Erreur lors de l'envoi à Airtable: {}", msg),
                )
            }
        };
        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Converts transport-level failures into `AppError::Upstream`.
/// Allows using `?` operator on Airtable calls.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}
