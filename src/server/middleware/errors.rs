use crate::error::{AppError, UnhandledError};
use crate::server::router::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use shopfront_schema::MessageErrorBody;
use std::any::Any;
use tracing::error;

pub const UNHANDLED_ERROR: &str = "Something went wrong!";
const PRODUCTION_MESSAGE: &str = "Internal server error";

/// Terminal error handler: any response tagged with [`UnhandledError`] is logged with full
/// detail and its body replaced by the client-facing JSON. Detail is only exposed outside
/// production.
pub async fn render_unhandled(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let resp = next.run(req).await;

    let Some(unhandled) = resp.extensions().get::<UnhandledError>().cloned() else {
        return resp;
    };
    error!(%method, %path, error = %unhandled.detail(), "Unhandled error");

    let message = if state.config.is_production() {
        PRODUCTION_MESSAGE.to_string()
    } else {
        unhandled.detail().to_string()
    };
    let body = MessageErrorBody {
        error: UNHANDLED_ERROR.to_string(),
        message,
    };
    let bytes = match serde_json::to_vec(&body) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to serialize error body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Keep headers set by outer layers (CORS, security); only the payload changes.
    let (mut parts, _) = resp.into_parts();
    parts.status = StatusCode::INTERNAL_SERVER_ERROR;
    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(bytes))
}

/// `CatchPanicLayer` hook: a panic becomes an ordinary [`AppError`].
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Panic(panic_message(panic.as_ref())).into_response()
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    }
}
