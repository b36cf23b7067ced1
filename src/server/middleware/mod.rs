//! Cross-cutting request processors, applied by `shopfront_router` in this order
//! (outermost first): access log, error rendering, panic capture, security headers, CORS,
//! rate limiting, body limit, context injection.

pub mod access_log;
pub mod cors;
pub mod errors;
pub mod rate_limit;
pub mod security;

pub use access_log::access_log;
pub use cors::{OriginPolicy, cors_layer};
pub use errors::{panic_response, render_unhandled};
pub use rate_limit::{RateLimitConfig, RateLimiter, rate_limit};
pub use security::with_security_headers;
