// File: keyledger-common/src/models/mod.rs
pub mod code;
pub mod credential;
pub mod notification;
pub mod purchase;
pub mod user;

pub use code::{CodeStatus, RedeemableCode};
pub use credential::{AdminCredential, CredentialStatus};
pub use notification::{NotificationEvent, NotificationKind};
pub use purchase::{Purchase, PurchaseStatus};
pub use user::User;
