pub mod admin;

pub use admin::{AdminAuthError, RequireAdminKey};
