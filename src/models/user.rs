use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An end user of the service. Only a hash of the bearer token is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    /// Hex-encoded SHA-256 of the bearer token.
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(display_name: String, token_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            token_hash,
            created_at: Utc::now(),
        }
    }
}
