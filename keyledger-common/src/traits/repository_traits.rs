// File: keyledger-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::code::RedeemableCode;
use crate::models::credential::AdminCredential;
use crate::models::purchase::Purchase;
use crate::models::user::User;

/// Store of admin keys. There is no create operation at this layer;
/// provisioning is manual.
#[async_trait]
pub trait AdminCredentialRepository: Send + Sync {
    /// True iff the key exists and is active. Touches last_used_at as a
    /// side effect (best-effort; lost updates to the timestamp are fine).
    /// An unknown key is `Ok(false)`, not an error.
    async fn validate(&self, key: &str) -> Result<bool, Error>;

    /// Idempotent. Flips the credential to revoked if present, no-op
    /// otherwise. The row is kept.
    async fn revoke(&self, key: &str) -> Result<(), Error>;

    async fn get(&self, key: &str) -> Result<Option<AdminCredential>, Error>;
}

/// Ledger of single-use premium codes.
#[async_trait]
pub trait RedeemableCodeRepository: Send + Sync {
    /// Insert a fresh code. Uniqueness is enforced by the store; a
    /// collision surfaces as a database error for the caller to retry.
    async fn insert(&self, code: &RedeemableCode) -> Result<(), Error>;

    async fn get(&self, code: &str) -> Result<Option<RedeemableCode>, Error>;

    /// Flip `code` from active to redeemed, attributing it to
    /// `redeemed_by`, in one conditional update so concurrent attempts
    /// cannot both win. When `replacement` is given it is inserted in the
    /// same transaction (the opt-in refill policy).
    ///
    /// Fails `NotFound` if the code never existed, `AlreadyRedeemed` if it
    /// was consumed before.
    async fn redeem(
        &self,
        code: &str,
        redeemed_by: &str,
        replacement: Option<&RedeemableCode>,
    ) -> Result<(), Error>;
}

/// Purchase claims moving pending -> approved | rejected, exactly once.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Intake: insert a new pending claim.
    async fn create(&self, purchase: &Purchase) -> Result<(), Error>;

    async fn get(&self, purchase_id: &str) -> Result<Option<Purchase>, Error>;

    /// One transaction: insert the minted `code` and conditionally flip
    /// the purchase to approved. A purchase that is missing or no longer
    /// pending rolls the whole thing back, so no orphaned code row can
    /// outlive a failed approval.
    async fn approve(
        &self,
        purchase_id: &str,
        code: &RedeemableCode,
        validated_at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Conditionally flip the purchase to rejected, recording the reason.
    async fn reject(
        &self,
        purchase_id: &str,
        reason: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Pending claims, newest first, bounded by `limit`.
    async fn list_pending(&self, limit: i64) -> Result<Vec<Purchase>, Error>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, username: &str) -> Result<Option<User>, Error>;
}
