// File: keyledger-common/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal user row, kept for redemption attribution only.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub is_premium_since: Option<DateTime<Utc>>,
    pub redeemed_code: Option<String>,
    pub created_at: DateTime<Utc>,
}
