//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Session error: {0}")]
    Session(#[from] session_store::SessionError),

    #[error("Chain error: {0}")]
    Chain(#[from] payment_verifier::ChainError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match &self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Session(_) => "SESSION_ERROR",
            AppError::Chain(_) => "CHAIN_ERROR",
            AppError::Server(_) => "INTERNAL_ERROR",
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Server(e.to_string())
    }
}
