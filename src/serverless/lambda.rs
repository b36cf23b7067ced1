//! AWS Lambda glue: converts between `lambda_http` events and the adapter's HTTP types.

use super::Adapter;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use lambda_http::{RequestExt, service_fn};
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::time::Instant;
use tracing::info;

/// Runs the Lambda event loop until the host shuts the function down.
pub async fn run(adapter: Arc<Adapter>) -> Result<(), lambda_http::Error> {
    info!("Starting Lambda runtime");
    lambda_http::run(service_fn(move |event: lambda_http::Request| {
        let adapter = adapter.clone();
        async move { invoke(&adapter, event).await }
    }))
    .await
}

pub async fn invoke(
    adapter: &Adapter,
    event: lambda_http::Request,
) -> Result<Response<lambda_http::Body>, lambda_http::Error> {
    let deadline = event
        .lambda_context_ref()
        .map(|ctx| deadline_from_epoch_ms(ctx.deadline, SystemTime::now()));

    let (parts, body) = event.into_parts();
    let body = match body {
        lambda_http::Body::Empty => Body::empty(),
        lambda_http::Body::Text(text) => Body::from(text),
        lambda_http::Body::Binary(bytes) => Body::from(bytes),
    };

    let resp = adapter.handle(Request::from_parts(parts, body), deadline).await?;

    // The adapter already buffered the body; this only moves it into the Lambda payload.
    let (parts, body) = resp.into_parts();
    let bytes = to_bytes(body, usize::MAX).await?;
    let body = if bytes.is_empty() {
        lambda_http::Body::Empty
    } else {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => lambda_http::Body::Text(text),
            Err(e) => lambda_http::Body::Binary(e.into_bytes()),
        }
    };
    Ok(Response::from_parts(parts, body))
}

/// Converts the Lambda deadline (milliseconds since the Unix epoch) into a tokio instant.
fn deadline_from_epoch_ms(deadline_ms: u64, now: SystemTime) -> Instant {
    let now_ms = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    Instant::now() + Duration::from_millis(deadline_ms.saturating_sub(now_ms))
}
