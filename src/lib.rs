pub mod config;
pub mod db;
pub mod error;
pub mod fallback;
pub mod runtime;
pub mod server;
pub mod serverless;

pub use config::Config;
pub use db::Database;
pub use error::{AdapterError, AppError, ConfigurationError};
pub use server::{AppState, shopfront_router};
pub use serverless::Adapter;
