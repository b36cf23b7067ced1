//! Startup branch selection and the standalone server lifecycle.

use crate::config::Config;
use crate::db::{self, Database};
use crate::server::{AppState, shopfront_router};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::{net::TcpListener, signal};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// A function host drives requests; no listener and no database.
    Hosted,
    /// Long-lived local process bound to loopback.
    Standalone,
}

impl RuntimeMode {
    pub fn detect(cfg: &Config) -> Self {
        if cfg.is_hosted() {
            RuntimeMode::Hosted
        } else {
            RuntimeMode::Standalone
        }
    }

    /// Connectivity for this mode. Hosted processes never attempt a connection.
    pub async fn connect(self, cfg: &Config) -> Database {
        match self {
            RuntimeMode::Hosted => {
                info!("Hosted execution detected, skipping database initialization");
                Database::Unavailable
            }
            RuntimeMode::Standalone => db::initialize(cfg.database_url()).await,
        }
    }
}

/// starting -> serving -> shutting down -> terminated.
///
/// Returns an error only when the listener cannot be bound or the server fails.
pub async fn serve(cfg: Config) -> std::io::Result<()> {
    let db = RuntimeMode::Standalone.connect(&cfg).await;
    info!(
        connected = db.is_connected(),
        app_env = %cfg.app_env,
        "Starting server"
    );

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, cfg.port));
    let state = AppState::new(Arc::new(cfg), db.clone());
    let app = shopfront_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutting down, releasing database");
    db.close().await;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received terminate signal"),
    }
}
