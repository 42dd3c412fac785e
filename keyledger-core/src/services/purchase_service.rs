// File: keyledger-core/src/services/purchase_service.rs

use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};

use crate::Error;
use crate::services::redemption_service::generate_code;
use keyledger_common::models::code::RedeemableCode;
use keyledger_common::models::notification::NotificationEvent;
use keyledger_common::models::purchase::Purchase;
use keyledger_common::traits::notify_traits::NotificationSink;
use keyledger_common::traits::repository_traits::{
    AdminCredentialRepository, PurchaseRepository,
};

/// What an approval hands back to the staff UI: the minted code plus the
/// line to paste into chat.
#[derive(Debug, Clone)]
pub struct Approval {
    pub code: String,
    pub notify_text: String,
}

/// Drives a purchase through its one-shot pending -> approved | rejected
/// transition.
pub struct PurchaseService {
    credential_repo: Arc<dyn AdminCredentialRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    sink: Arc<dyn NotificationSink>,
    page_size: i64,
}

impl PurchaseService {
    pub fn new(
        credential_repo: Arc<dyn AdminCredentialRepository>,
        purchase_repo: Arc<dyn PurchaseRepository>,
        sink: Arc<dyn NotificationSink>,
        page_size: i64,
    ) -> Self {
        Self {
            credential_repo,
            purchase_repo,
            sink,
            page_size,
        }
    }

    pub async fn approve(&self, purchase_id: &str, admin_key: &str) -> Result<Approval, Error> {
        if !self.credential_repo.validate(admin_key).await? {
            return Err(Error::Unauthorized);
        }

        let code = RedeemableCode::new(generate_code()?);
        self.purchase_repo
            .approve(purchase_id, &code, Utc::now())
            .await?;
        info!("purchase {} approved, issued code {}", purchase_id, code.code);

        let event = NotificationEvent::approved(purchase_id, &code.code);
        self.dispatch(&event).await;

        Ok(Approval {
            code: code.code,
            notify_text: event.summary,
        })
    }

    pub async fn reject(
        &self,
        purchase_id: &str,
        admin_key: &str,
        reason: &str,
    ) -> Result<String, Error> {
        if reason.trim().is_empty() {
            return Err(Error::Validation(
                "rejection reason must not be empty".to_string(),
            ));
        }
        if !self.credential_repo.validate(admin_key).await? {
            return Err(Error::Unauthorized);
        }

        self.purchase_repo
            .reject(purchase_id, reason, Utc::now())
            .await?;
        info!("purchase {} rejected: {}", purchase_id, reason);

        let event = NotificationEvent::rejected(purchase_id, reason);
        self.dispatch(&event).await;

        Ok(event.summary)
    }

    pub async fn list_pending(&self, admin_key: &str) -> Result<Vec<Purchase>, Error> {
        if !self.credential_repo.validate(admin_key).await? {
            return Err(Error::Unauthorized);
        }
        self.purchase_repo.list_pending(self.page_size).await
    }

    /// One attempt, failures swallowed. The transition is already
    /// committed by the time this runs.
    async fn dispatch(&self, event: &NotificationEvent) {
        if let Err(e) = self.sink.notify(event).await {
            warn!("notification sink failed for {}: {:?}", event.kind, e);
        }
    }
}
