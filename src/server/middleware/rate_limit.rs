//! Fixed-window request limiter keyed by client address.
//!
//! Each identity owns one counter that lives for exactly one window: the moka entry is
//! created on the first hit and expires `window` later, which starts the next window.
//! Requests answered with a 2xx are refunded, so only failing traffic consumes the budget.

use crate::server::router::{AppState, HEALTH_PATH};
use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use headers::{HeaderMapExt, RetryAfter};
use moka::sync::Cache;
use shopfront_schema::RateLimitBody;
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};
use tracing::warn;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Seconds advertised to rejected clients.
pub const RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_hits: u32,
    pub max_tracked_clients: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_hits: 200,
            max_tracked_clients: 100_000,
        }
    }
}

pub struct RateLimiter {
    max_hits: u32,
    windows: Cache<Arc<str>, Arc<AtomicU32>>,
}

/// A counted hit that can be handed back once the response is known.
pub struct Hit {
    counter: Arc<AtomicU32>,
}

impl Hit {
    pub fn refund(self) {
        let _ = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let windows = Cache::builder()
            .max_capacity(config.max_tracked_clients)
            .time_to_live(config.window)
            .build();
        Self {
            max_hits: config.max_hits,
            windows,
        }
    }

    /// Counts one request for `identity`. Returns `None` once the window's budget is spent.
    pub fn hit(&self, identity: &str) -> Option<Hit> {
        let counter = self
            .windows
            .get_with(Arc::from(identity), || Arc::new(AtomicU32::new(0)));
        let hits = counter.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        (hits <= self.max_hits).then_some(Hit { counter })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Client identity, trusting exactly one proxy hop: the right-most `X-Forwarded-For` entry,
/// then the peer address.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').map(str::trim).find(|s| !s.is_empty()))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests() -> Response {
    let mut resp = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RateLimitBody {
            error: "Too many requests, please try again later.".to_string(),
            retry_after: RETRY_AFTER_SECS,
        }),
    )
        .into_response();
    resp.headers_mut()
        .typed_insert(RetryAfter::delay(Duration::from_secs(RETRY_AFTER_SECS)));
    resp
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.uri().path() == HEALTH_PATH {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = client_identity(req.headers(), peer);

    let Some(hit) = state.limiter.hit(&identity) else {
        warn!(client = %identity, "Rate limit exceeded");
        return too_many_requests();
    };

    let resp = next.run(req).await;
    if resp.status().is_success() {
        hit.refund();
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn identity_prefers_last_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.9, 198.51.100.7"),
        );
        let peer: SocketAddr = "10.0.0.1:4000".parse().expect("valid socket addr");
        assert_eq!(client_identity(&headers, Some(peer)), "198.51.100.7");
    }

    #[test]
    fn identity_falls_back_to_peer_then_unknown() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.1:4000".parse().expect("valid socket addr");
        assert_eq!(client_identity(&headers, Some(peer)), "10.0.0.1");
        assert_eq!(client_identity(&headers, None), "unknown");
    }

    #[test]
    fn budget_is_per_identity_and_refunds_restore_it() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_hits: 2,
            ..RateLimitConfig::default()
        });

        assert!(limiter.hit("a").is_some());
        let second = limiter.hit("a").expect("second hit allowed");
        assert!(limiter.hit("a").is_none());
        assert!(limiter.hit("b").is_some());

        // The rejected third hit still counted, so one refund is not enough.
        second.refund();
        assert!(limiter.hit("a").is_none());
    }

    #[test]
    fn refunded_hits_never_accumulate() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_hits: 1,
            ..RateLimitConfig::default()
        });
        for _ in 0..10 {
            limiter.hit("a").expect("refunded hits keep the budget").refund();
        }
        assert!(limiter.hit("a").is_some());
        assert!(limiter.hit("a").is_none());
    }

    #[test]
    fn window_expiry_resets_the_budget() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window: Duration::from_millis(50),
            max_hits: 1,
            ..RateLimitConfig::default()
        });
        assert!(limiter.hit("a").is_some());
        assert!(limiter.hit("a").is_none());
        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.hit("a").is_some());
    }
}
