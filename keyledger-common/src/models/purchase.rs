// File: keyledger-common/src/models/purchase.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::Approved => write!(f, "approved"),
            PurchaseStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PurchaseStatus::Pending),
            "approved" => Ok(PurchaseStatus::Approved),
            "rejected" => Ok(PurchaseStatus::Rejected),
            _ => Err(format!("Unknown purchase status: {}", s)),
        }
    }
}

/// A manually-submitted payment claim. Created pending by an external
/// intake process; validated exactly once by staff. issued_code is set
/// iff approved, rejection_reason iff rejected. Amounts are minor
/// currency units (centavos).
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Purchase {
    pub purchase_id: String,
    pub buyer_email: String,
    pub amount_cents: i64,
    pub payment_ref: String,
    pub status: PurchaseStatus,
    pub issued_code: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl Purchase {
    /// New pending claim, as the intake process would hand it over.
    pub fn new_pending(
        purchase_id: &str,
        buyer_email: &str,
        amount_cents: i64,
        payment_ref: &str,
    ) -> Self {
        Self {
            purchase_id: purchase_id.to_string(),
            buyer_email: buyer_email.to_string(),
            amount_cents,
            payment_ref: payment_ref.to_string(),
            status: PurchaseStatus::Pending,
            issued_code: None,
            rejection_reason: None,
            created_at: Utc::now(),
            validated_at: None,
        }
    }
}
