use crate::config::Config;
use crate::db::Database;
use crate::server::context::inject_context;
use crate::server::extract::BODY_LIMIT_BYTES;
use crate::server::middleware::{
    OriginPolicy, RateLimitConfig, RateLimiter, access_log, cors_layer, panic_response,
    rate_limit, render_unhandled, with_security_headers,
};
use crate::server::routes::{admin, auth, orders, products, users};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::Key;
use shopfront_schema::{ErrorBody, HealthStatus};
use std::sync::{Arc, LazyLock};
use tower_http::catch_panic::CatchPanicLayer;

pub const HEALTH_PATH: &str = "/api/health";

/// Global cookie signing/encryption key for PrivateCookieJar.
static COOKIE_KEY: LazyLock<Key> = LazyLock::new(Key::generate);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: Database) -> Self {
        Self {
            config,
            db,
            limiter: Arc::new(RateLimiter::default()),
        }
    }

    pub fn with_rate_limit(mut self, limits: RateLimitConfig) -> Self {
        self.limiter = Arc::new(RateLimiter::new(limits));
        self
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        let _ = state; // state not used to fetch the static key
        COOKIE_KEY.clone()
    }
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus::ok_now())
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Route not found")))
}

pub fn shopfront_router(state: AppState) -> Router {
    let origins = OriginPolicy::from_config(&state.config);

    // Layers run outermost-last: the final `.layer` sees the request first.
    let routes = Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/products", products::router())
        .nest("/api/orders", orders::router())
        .nest("/api/admin", admin::router(state.clone()))
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), inject_context))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(cors_layer(origins));

    with_security_headers(routes)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), render_unhandled))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, access_log))
}
