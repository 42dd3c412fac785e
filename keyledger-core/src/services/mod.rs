// src/services/mod.rs

pub mod credential_service;
pub mod notification;
pub mod purchase_service;
pub mod redemption_service;

pub use credential_service::CredentialService;
pub use notification::{DiscordWebhookSink, NullSink};
pub use purchase_service::{Approval, PurchaseService};
pub use redemption_service::{RedemptionService, generate_code, CODE_PREFIX};
