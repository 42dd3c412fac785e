// File: keyledger-common/src/models/notification.rs

use std::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Approved,
    Rejected,
    Redeemed,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Approved => write!(f, "approved"),
            NotificationKind::Rejected => write!(f, "rejected"),
            NotificationKind::Redeemed => write!(f, "redeemed"),
        }
    }
}

/// Outbound, best-effort event describing a committed state transition.
/// Delivery is at-most-once; a failed send never affects the transition.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub purchase_id: Option<String>,
    pub code: Option<String>,
    pub summary: String,
}

impl NotificationEvent {
    pub fn approved(purchase_id: &str, code: &str) -> Self {
        Self {
            kind: NotificationKind::Approved,
            purchase_id: Some(purchase_id.to_string()),
            code: Some(code.to_string()),
            summary: format!(
                "Purchase {} has been approved. Send code: {}",
                purchase_id, code
            ),
        }
    }

    pub fn rejected(purchase_id: &str, reason: &str) -> Self {
        Self {
            kind: NotificationKind::Rejected,
            purchase_id: Some(purchase_id.to_string()),
            code: None,
            summary: format!(
                "Purchase {} has been rejected. Reason: {}",
                purchase_id, reason
            ),
        }
    }

    pub fn redeemed(code: &str, username: &str) -> Self {
        Self {
            kind: NotificationKind::Redeemed,
            purchase_id: None,
            code: Some(code.to_string()),
            summary: format!("Code {} redeemed by {}.", code, username),
        }
    }
}
