use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User fields that are safe to hand to any client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `GET /api/auth/me`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl SessionStatus {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }

    pub fn signed_in(user: PublicUser) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
        }
    }
}
