mod adapter;
mod app;

pub use adapter::{AdapterError, ConfigurationError};
pub use app::{AppError, UnhandledError};
