// File: keyledger-common/src/models/code.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum CodeStatus {
    Active,
    Redeemed,
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeStatus::Active => write!(f, "active"),
            CodeStatus::Redeemed => write!(f, "redeemed"),
        }
    }
}

impl FromStr for CodeStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CodeStatus::Active),
            "redeemed" => Ok(CodeStatus::Redeemed),
            _ => Err(format!("Unknown code status: {}", s)),
        }
    }
}

/// A single-use premium code. The active -> redeemed flip happens exactly
/// once, and redeemed_by / redeemed_at are set in the same update.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct RedeemableCode {
    pub code: String,
    pub status: CodeStatus,
    pub created_at: DateTime<Utc>,
    pub redeemed_by: Option<String>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl RedeemableCode {
    /// Fresh active code wrapping an already-generated code string.
    pub fn new(code: String) -> Self {
        Self {
            code,
            status: CodeStatus::Active,
            created_at: Utc::now(),
            redeemed_by: None,
            redeemed_at: None,
        }
    }
}
