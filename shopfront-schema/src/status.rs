use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn ok_now() -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// `{ "error": "..." }`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `{ "error": "...", "message": "..." }`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MessageErrorBody {
    pub error: String,
    pub message: String,
}

/// Body returned once a client exhausts its rate-limit window.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RateLimitBody {
    pub error: String,
    #[serde(rename = "retryAfter")]
    pub retry_after: u64,
}

/// Body of `GET /api/admin/stats`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StoreStats {
    pub users: i64,
    pub products: i64,
    pub orders: i64,
    pub connected: bool,
}
