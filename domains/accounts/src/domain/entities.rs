//! Account domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity principal. Created by signup; never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string; salt and parameters embedded
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One-shot bearer credential. Every successful refresh deletes the
/// presented token and creates a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// Opaque random identifier (256 bits, base64url)
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
