// File: keyledger-core/src/services/notification.rs

use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::Error;
use crate::http::HttpClient;
use keyledger_common::models::notification::{NotificationEvent, NotificationKind};
use keyledger_common::traits::notify_traits::NotificationSink;

/// Posts transition summaries to a Discord webhook as a single embed.
/// Strictly outbound: one attempt, bounded by the HTTP client's timeout.
pub struct DiscordWebhookSink {
    http: Arc<dyn HttpClient>,
    webhook_url: String,
}

impl DiscordWebhookSink {
    pub fn new(http: Arc<dyn HttpClient>, webhook_url: String) -> Self {
        Self { http, webhook_url }
    }

    fn embed_title(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Approved => "Purchase approved",
            NotificationKind::Rejected => "Purchase rejected",
            NotificationKind::Redeemed => "Premium code redeemed",
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhookSink {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), Error> {
        let payload = json!({
            "username": "Ledger Monitor",
            "embeds": [
                {
                    "title": Self::embed_title(event.kind),
                    "description": event.summary,
                    "color": 0xf97316,
                    "timestamp": Utc::now().to_rfc3339(),
                    "footer": {
                        "text": "Key Ledger System Log"
                    }
                }
            ]
        });

        self.http.post_json(&self.webhook_url, &payload).await
    }
}

/// Used when no webhook is configured; events are dropped quietly.
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), Error> {
        debug!("notifications disabled; dropping {} event", event.kind);
        Ok(())
    }
}
