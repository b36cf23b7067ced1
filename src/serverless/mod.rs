//! Function-host entry point.
//!
//! A host invocation goes through [`Adapter::handle`]: the application module is loaded and
//! its export checked once ([`Invocable::resolve`]), the request is delegated, and the
//! response body is drained until it finishes, the invocation deadline closes it, or the
//! stream fails.

mod adapter;
mod export;
pub mod lambda;

pub use adapter::{Adapter, Completion};
pub use export::{ApplicationModule, Export, Invocable, ModuleLoader, RequestHandler};
