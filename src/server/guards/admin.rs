use crate::server::router::AppState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use shopfront_schema::ErrorBody;
use subtle::ConstantTimeEq;

fn extract_admin_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(k) = headers.get("x-admin-key").and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Admits a request only when it presents `ADMIN_KEY`.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<AppState> for RequireAdminKey {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_key() else {
            return Err(AdminAuthError::Disabled);
        };

        match extract_admin_token(&parts.headers) {
            Some(key) if bool::from(key.as_bytes().ct_eq(expected.as_bytes())) => {
                Ok(RequireAdminKey)
            }
            Some(_) => Err(AdminAuthError::InvalidKey),
            None => Err(AdminAuthError::MissingKey),
        }
    }
}

#[derive(Debug)]
pub enum AdminAuthError {
    Disabled,
    MissingKey,
    InvalidKey,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            AdminAuthError::Disabled => (StatusCode::FORBIDDEN, "Admin access is disabled"),
            AdminAuthError::MissingKey => (StatusCode::UNAUTHORIZED, "Missing admin key"),
            AdminAuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid admin key"),
        };
        (status, Json(ErrorBody::new(reason))).into_response()
    }
}
