use crate::db::Database;
use crate::error::AppError;
use crate::server::router::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;

/// Per-request view of the connectivity state, attached by [`inject_context`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub db: Database,
}

impl RequestContext {
    pub fn is_connected(&self) -> bool {
        self.db.is_connected()
    }

    pub fn pool(&self) -> Option<&SqlitePool> {
        self.db.pool()
    }
}

/// Last stage of the middleware chain: hands every request the shared database state.
pub async fn inject_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    req.extensions_mut().insert(RequestContext {
        db: state.db.clone(),
    });
    next.run(req).await
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Unexpected("request context was not attached".to_string()))
    }
}
