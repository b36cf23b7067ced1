//! One structured log line per request, keyed by an `x-request-id` echoed back to the client.

use super::rate_limit::client_identity;
use crate::server::router::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, header::USER_AGENT},
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::{net::SocketAddr, time::Instant};
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The caller's request id when usable, otherwise a fresh 96-bit one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let mut bytes = [0u8; 12];
            rand::rng().fill_bytes(&mut bytes);
            URL_SAFE_NO_PAD.encode(bytes)
        })
}

pub async fn access_log(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = request_id(req.headers());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(req.headers(), peer);
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    let db_connected = state.db.is_connected();

    if status.is_server_error() {
        error!(
            %request_id, %method, %path, status = status.as_u16(), latency_ms,
            %client, db_connected, %user_agent, "Request failed"
        );
    } else if status.is_client_error() {
        warn!(
            %request_id, %method, %path, status = status.as_u16(), latency_ms,
            %client, db_connected, %user_agent, "Request rejected"
        );
    } else {
        info!(
            %request_id, %method, %path, status = status.as_u16(), latency_ms,
            %client, db_connected, "Request served"
        );
    }

    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_request_ids_are_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static(" trace-42 "));
        assert_eq!(request_id(&headers), "trace-42");
    }

    #[test]
    fn missing_or_oversized_ids_are_replaced() {
        let generated = request_id(&HeaderMap::new());
        assert_eq!(generated.len(), 16);

        let mut headers = HeaderMap::new();
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        headers.insert(
            X_REQUEST_ID,
            HeaderValue::from_str(&long).expect("ascii header value"),
        );
        let replaced = request_id(&headers);
        assert_ne!(replaced, long);
        assert_eq!(replaced.len(), 16);
    }
}
