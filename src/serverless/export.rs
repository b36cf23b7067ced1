use crate::config::Config;
use crate::db::Database;
use crate::error::{AdapterError, ConfigurationError};
use crate::server::{AppState, shopfront_router};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use std::sync::Arc;
use tower::ServiceExt;
use tracing::{error, warn};

/// An object that serves requests through a member rather than being callable itself.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, req: Request<Body>) -> Response<Body>;
}

#[async_trait]
impl RequestHandler for Router {
    async fn handle(&self, req: Request<Body>) -> Response<Body> {
        self.clone()
            .oneshot(req)
            .await
            .unwrap_or_else(|never| match never {})
    }
}

/// Whatever an application module hands back when loaded.
pub enum Export {
    /// The request handler itself.
    Callable(Router),
    /// An object; `None` when it carries no request-handling member.
    Object(Option<Arc<dyn RequestHandler>>),
    /// A default-export wrapper around the real value.
    Default(Box<Export>),
    Null,
    /// Any other plain value, described by its kind (e.g. "string").
    Scalar(String),
}

/// The two accepted shapes of a loaded application.
#[derive(Clone)]
pub enum Invocable {
    Direct(Router),
    Member(Arc<dyn RequestHandler>),
}

impl Invocable {
    /// Checks the shape of `export`, looking through at most one `Default` wrapper.
    pub fn resolve(export: Export) -> Result<Self, ConfigurationError> {
        let export = match export {
            Export::Default(inner) => *inner,
            other => other,
        };

        match export {
            Export::Callable(router) => Ok(Invocable::Direct(router)),
            Export::Object(Some(handler)) => Ok(Invocable::Member(handler)),
            Export::Object(None) => {
                error!("Application export is an object without a request handler member");
                Err(ConfigurationError::MissingHandler)
            }
            Export::Null => {
                error!("Application export is null");
                Err(ConfigurationError::Null)
            }
            Export::Scalar(kind) => {
                error!(kind = %kind, "Application export is not invocable");
                Err(ConfigurationError::NotInvocable(kind))
            }
            Export::Default(_) => {
                error!("Application export nests more than one default wrapper");
                Err(ConfigurationError::NestedTooDeep)
            }
        }
    }

    pub async fn invoke(&self, req: Request<Body>) -> Response<Body> {
        match self {
            Invocable::Direct(router) => router.handle(req).await,
            Invocable::Member(handler) => handler.handle(req).await,
        }
    }
}

/// Produces the application export for an invocation context.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, config: &Config) -> Result<Export, AdapterError>;
}

/// Loads the store application. Hosted invocations never hold a database connection, so the
/// router is built against fallback data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationModule;

#[async_trait]
impl ModuleLoader for ApplicationModule {
    async fn load(&self, config: &Config) -> Result<Export, AdapterError> {
        if !config.is_hosted() {
            warn!("Loading the application module outside a hosted context");
        }
        let state = AppState::new(Arc::new(config.clone()), Database::Unavailable);
        Ok(Export::Callable(shopfront_router(state)))
    }
}
