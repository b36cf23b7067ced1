pub mod context;
pub mod extract;
pub mod guards;
pub mod middleware;
pub mod router;
pub mod routes;

pub use context::RequestContext;
pub use router::{AppState, shopfront_router};
