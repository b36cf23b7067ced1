use crate::db::{Database, queries};
use crate::error::AppError;
use crate::fallback::FallbackData;
use crate::server::{RequestContext, guards::RequireAdminKey, router::AppState};
use axum::{Json, Router, middleware, routing::get};
use shopfront_schema::StoreStats;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(store_stats))
        .route_layer(middleware::from_extractor_with_state::<RequireAdminKey, _>(
            state,
        ))
}

/// GET /api/admin/stats
pub async fn store_stats(ctx: RequestContext) -> Result<Json<StoreStats>, AppError> {
    let stats = match &ctx.db {
        Database::Available(pool) => queries::stats(pool).await?,
        Database::Unavailable => FallbackData::get().stats(),
    };
    Ok(Json(stats))
}
