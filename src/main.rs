use mimalloc::MiMalloc;
use shopfront::{
    config::Config,
    runtime::{self, RuntimeMode},
    serverless::{self, Adapter},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;
    let mode = RuntimeMode::detect(&cfg);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    // Function hosts timestamp log lines themselves.
    let (json, compact) = match mode {
        RuntimeMode::Hosted => (
            Some(tracing_subscriber::fmt::layer().json().without_time()),
            None,
        ),
        RuntimeMode::Standalone => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_level(true)
                    .with_target(false),
            ),
        ),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(compact)
        .init();

    info!(
        mode = ?mode,
        app_env = %cfg.app_env,
        database = cfg.database_url().is_some(),
        port = cfg.port,
        frontend_url = %cfg.frontend_url.as_deref().unwrap_or("<none>"),
        admin = cfg.admin_key().is_some(),
    );

    match mode {
        RuntimeMode::Hosted => serverless::lambda::run(Arc::new(Adapter::new(&cfg))).await,
        RuntimeMode::Standalone => Ok(runtime::serve(cfg).await?),
    }
}
