pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shopfront_schema::ErrorBody;

/// Path ids are parsed leniently: anything that is not an integer simply matches nothing.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub(crate) fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(message))).into_response()
}

pub(crate) fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
}
