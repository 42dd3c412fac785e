// File: keyledger-common/src/models/credential.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Add sqlx::Type so that SQLx knows how to decode this enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Revoked,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "active"),
            CredentialStatus::Revoked => write!(f, "revoked"),
        }
    }
}

impl FromStr for CredentialStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CredentialStatus::Active),
            "revoked" => Ok(CredentialStatus::Revoked),
            _ => Err(format!("Unknown credential status: {}", s)),
        }
    }
}

/// An opaque admin key. Rows are never deleted; revocation flips the
/// status and the row stays behind as an audit trail.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct AdminCredential {
    pub key: String,
    pub status: CredentialStatus,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
