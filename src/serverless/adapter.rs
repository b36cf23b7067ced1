use super::export::{ApplicationModule, Invocable, ModuleLoader};
use crate::config::Config;
use crate::error::{AdapterError, ConfigurationError};
use crate::server::middleware::errors::panic_message;
use axum::{
    Json,
    body::{Body, Bytes},
    http::{Request, Response, StatusCode, header::CONTENT_LENGTH},
    response::IntoResponse,
};
use futures::{FutureExt, StreamExt};
use shopfront_schema::MessageErrorBody;
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio::{sync::OnceCell, time::Instant};
use tracing::{debug, error, warn};

/// How a delegated response ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The body reached end-of-stream.
    Finished,
    /// The invocation deadline passed before the body finished; what was written is kept.
    Closed,
}

/// Bridges host invocations into the application.
///
/// The configuration is fixed at construction to production + hosted, replacing any
/// per-invocation environment mutation. The resolved application is cached for the life of
/// the execution context once a load succeeds; failed loads are retried on the next call.
pub struct Adapter {
    config: Arc<Config>,
    loader: Arc<dyn ModuleLoader>,
    app: OnceCell<Invocable>,
}

impl Adapter {
    pub fn new(config: &Config) -> Self {
        Self::with_loader(config, Arc::new(ApplicationModule))
    }

    pub fn with_loader(config: &Config, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            config: Arc::new(config.for_hosted()),
            loader,
            app: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serves one invocation.
    ///
    /// Only a failing response stream is returned as an error, for the host to dispose of.
    /// Shape problems become a 500 configuration body; load failures and panics a generic 500.
    pub async fn handle(
        &self,
        req: Request<Body>,
        deadline: Option<Instant>,
    ) -> Result<Response<Body>, AdapterError> {
        let outcome = AssertUnwindSafe(self.dispatch(req, deadline))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(AdapterError::Configuration(e))) => {
                error!(error = %e, "Server configuration error");
                Ok(configuration_error_response(&e))
            }
            Ok(Err(AdapterError::Transport(e))) => {
                error!(error = %e, "Response stream failed");
                Err(AdapterError::Transport(e))
            }
            Ok(Err(e)) => {
                error!(error = %e, "Invocation failed");
                Ok(internal_error_response())
            }
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Invocation panicked");
                Ok(internal_error_response())
            }
        }
    }

    async fn dispatch(
        &self,
        req: Request<Body>,
        deadline: Option<Instant>,
    ) -> Result<Response<Body>, AdapterError> {
        let app = self.application().await?;
        let resp = app.invoke(req).await;

        let (mut parts, body) = resp.into_parts();
        let (bytes, completion) = drain(body, deadline).await?;
        debug!(?completion, bytes = bytes.len(), "Response drained");
        if completion == Completion::Closed {
            warn!("Invocation deadline reached before the response finished");
        }

        parts.headers.remove(CONTENT_LENGTH);
        Ok(Response::from_parts(parts, Body::from(bytes)))
    }

    async fn application(&self) -> Result<&Invocable, AdapterError> {
        self.app
            .get_or_try_init(|| async {
                let export = self.loader.load(&self.config).await?;
                Ok::<_, AdapterError>(Invocable::resolve(export)?)
            })
            .await
    }
}

/// Reads `body` until it finishes, fails, or `deadline` passes.
pub(crate) async fn drain(
    body: Body,
    deadline: Option<Instant>,
) -> Result<(Bytes, Completion), AdapterError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    loop {
        let next = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, stream.next()).await {
                Ok(next) => next,
                Err(_) => return Ok((Bytes::from(buf), Completion::Closed)),
            },
            None => stream.next().await,
        };
        match next {
            Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
            Some(Err(e)) => return Err(AdapterError::Transport(e)),
            None => return Ok((Bytes::from(buf), Completion::Finished)),
        }
    }
}

fn configuration_error_response(e: &ConfigurationError) -> Response<Body> {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageErrorBody {
            error: "Server configuration error".to_string(),
            message: e.to_string(),
        }),
    )
        .into_response()
}

fn internal_error_response() -> Response<Body> {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageErrorBody {
            error: "Internal server error".to_string(),
            message: "An unexpected error occurred".to_string(),
        }),
    )
        .into_response()
}
