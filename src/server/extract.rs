use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use axum_extra::extract::Form;
use serde::de::DeserializeOwned;

/// Upper bound for JSON and URL-encoded request bodies.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Request body accepted as either JSON or `application/x-www-form-urlencoded`.
///
/// Form bodies may repeat a key to fill a `Vec` field.
///
/// Malformed or oversized bodies reject with [`AppError`], so they reach the terminal error
/// handler like any other failure.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        let mime = content_type
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or_default();

        if mime == "application/json" || mime.ends_with("+json") {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            Ok(Payload(value))
        } else if mime == "application/x-www-form-urlencoded" {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Payload(value))
        } else if mime.is_empty() {
            Err(AppError::UnsupportedContentType("<none>".to_string()))
        } else {
            Err(AppError::UnsupportedContentType(mime.to_string()))
        }
    }
}
