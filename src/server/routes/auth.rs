//! Demo sign-in: a known email address opens a session held in an encrypted cookie.

use super::parse_id;
use crate::db::{Database, queries};
use crate::error::AppError;
use crate::fallback::FallbackData;
use crate::server::{RequestContext, extract::Payload, router::AppState};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;
use shopfront_schema::{ErrorBody, PublicUser, SessionStatus};
use time::Duration;
use tracing::info;

pub const SESSION_COOKIE: &str = "shopfront_session";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

async fn user_by_email(ctx: &RequestContext, email: &str) -> Result<Option<PublicUser>, AppError> {
    Ok(match &ctx.db {
        Database::Available(pool) => queries::find_user_by_email(pool, email).await?,
        Database::Unavailable => FallbackData::get().user_by_email(email).cloned(),
    })
}

async fn user_by_id(ctx: &RequestContext, id: i64) -> Result<Option<PublicUser>, AppError> {
    Ok(match &ctx.db {
        Database::Available(pool) => queries::get_user(pool, id).await?,
        Database::Unavailable => FallbackData::get().user(id).cloned(),
    })
}

fn session_cookie(user_id: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, user_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(7))
        .build()
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: PrivateCookieJar,
    Payload(body): Payload<LoginRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim();
    let Some(user) = user_by_email(&ctx, email).await? else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Invalid credentials")),
        )
            .into_response());
    };

    info!(user_id = user.id, "Session opened");
    let jar = jar.add(session_cookie(user.id, state.config.is_production()));
    Ok((jar, Json(user)).into_response())
}

/// GET /api/auth/me
pub async fn me(
    ctx: RequestContext,
    jar: PrivateCookieJar,
) -> Result<Json<SessionStatus>, AppError> {
    let Some(user_id) = jar.get(SESSION_COOKIE).and_then(|c| parse_id(c.value())) else {
        return Ok(Json(SessionStatus::anonymous()));
    };

    Ok(Json(match user_by_id(&ctx, user_id).await? {
        Some(user) => SessionStatus::signed_in(user),
        None => SessionStatus::anonymous(),
    }))
}

/// POST /api/auth/logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
