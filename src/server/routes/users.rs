use super::{not_found, parse_id};
use crate::db::{Database, queries};
use crate::error::AppError;
use crate::fallback::FallbackData;
use crate::server::{RequestContext, router::AppState};
use axum::{
    Json, Router,
    extract::Path,
    response::{IntoResponse, Response},
    routing::get,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
}

/// GET /api/users
pub async fn list_users(ctx: RequestContext) -> Result<Response, AppError> {
    let users = match &ctx.db {
        Database::Available(pool) => queries::list_users(pool).await?,
        Database::Unavailable => FallbackData::get().users().to_vec(),
    };
    Ok(Json(users).into_response())
}

/// GET /api/users/{id}
pub async fn get_user(ctx: RequestContext, Path(id): Path<String>) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(not_found("User not found"));
    };

    let user = match &ctx.db {
        Database::Available(pool) => queries::get_user(pool, id).await?,
        Database::Unavailable => FallbackData::get().user(id).cloned(),
    };
    Ok(match user {
        Some(user) => Json(user).into_response(),
        None => not_found("User not found"),
    })
}
