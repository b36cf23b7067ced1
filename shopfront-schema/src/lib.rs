pub mod account;
pub mod catalog;
pub mod orders;
pub mod status;

pub use account::{PublicUser, SessionStatus};
pub use catalog::Product;
pub use orders::{NewOrder, NewOrderItem, Order, OrderItem};
pub use status::{ErrorBody, HealthStatus, MessageErrorBody, RateLimitBody, StoreStats};
