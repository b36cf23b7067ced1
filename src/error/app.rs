use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::FormRejection;
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Failures raised by middleware and route handlers.
///
/// None of these are rendered directly: `into_response` tags an empty 500 with an
/// [`UnhandledError`] extension and the terminal error middleware turns it into the client
/// body, so every failure goes through one place.
#[derive(Debug, ThisError)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Invalid form body: {0}")]
    Form(#[from] FormRejection),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Handler panicked: {0}")]
    Panic(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut resp = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        resp.extensions_mut()
            .insert(UnhandledError(Arc::from(self.to_string())));
        resp
    }
}

/// Marker carried on a response whose handler failed; holds the full diagnostic text.
#[derive(Debug, Clone)]
pub struct UnhandledError(pub Arc<str>);

impl UnhandledError {
    pub fn detail(&self) -> &str {
        &self.0
    }
}
