// File: keyledger-common/src/traits/notify_traits.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::notification::NotificationEvent;

/// Strictly-outbound observer of committed transitions. One attempt, no
/// retries; callers log failures and move on. Nothing downstream of this
/// trait may influence the state machine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), Error>;
}
