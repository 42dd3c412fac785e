// File: keyledger-core/src/services/redemption_service.rs

use std::fmt::Write as _;
use std::sync::Arc;
use rand_core::TryRngCore;
use tracing::{info, warn};

use crate::Error;
use crate::repositories::postgres::is_unique_violation;
use keyledger_common::models::code::RedeemableCode;
use keyledger_common::models::notification::NotificationEvent;
use keyledger_common::traits::notify_traits::NotificationSink;
use keyledger_common::traits::repository_traits::{
    AdminCredentialRepository, RedeemableCodeRepository,
};

pub const CODE_PREFIX: &str = "PRM-";

/// 16 OS-random bytes rendered as uppercase hex behind the `PRM-` prefix,
/// the shape the community tooling has always handed out.
pub fn generate_code() -> Result<String, Error> {
    let mut payload = [0u8; 16];
    rand::rngs::OsRng
        .try_fill_bytes(&mut payload)
        .map_err(|e| Error::Parse(format!("OS RNG failure: {}", e)))?;

    let mut out = String::with_capacity(CODE_PREFIX.len() + payload.len() * 2);
    out.push_str(CODE_PREFIX);
    for b in payload {
        let _ = write!(out, "{:02X}", b);
    }
    Ok(out)
}

/// Mints and redeems single-use premium codes.
pub struct RedemptionService {
    credential_repo: Arc<dyn AdminCredentialRepository>,
    code_repo: Arc<dyn RedeemableCodeRepository>,
    sink: Arc<dyn NotificationSink>,
    mint_replacement_on_redeem: bool,
}

impl RedemptionService {
    pub fn new(
        credential_repo: Arc<dyn AdminCredentialRepository>,
        code_repo: Arc<dyn RedeemableCodeRepository>,
        sink: Arc<dyn NotificationSink>,
        mint_replacement_on_redeem: bool,
    ) -> Self {
        Self {
            credential_repo,
            code_repo,
            sink,
            mint_replacement_on_redeem,
        }
    }

    /// Admin-gated mint of a fresh active code.
    pub async fn mint(&self, admin_key: &str) -> Result<RedeemableCode, Error> {
        if !self.credential_repo.validate(admin_key).await? {
            return Err(Error::Unauthorized);
        }
        let code = self.mint_unchecked().await?;
        info!("minted premium code {}", code.code);
        Ok(code)
    }

    /// Insert with one retry: with 128 bits of entropy a collision is
    /// negligible, but the unique constraint is what actually guarantees
    /// it, so honor it.
    async fn mint_unchecked(&self) -> Result<RedeemableCode, Error> {
        let first = RedeemableCode::new(generate_code()?);
        match self.code_repo.insert(&first).await {
            Ok(()) => Ok(first),
            Err(Error::Database(e)) if is_unique_violation(&e) => {
                warn!("premium code collision, regenerating");
                let second = RedeemableCode::new(generate_code()?);
                self.code_repo.insert(&second).await?;
                Ok(second)
            }
            Err(e) => Err(e),
        }
    }

    /// Redeem `code` for `username`. Returns the replacement code when the
    /// refill policy is enabled, `None` otherwise.
    pub async fn redeem(&self, code: &str, username: &str) -> Result<Option<String>, Error> {
        if username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }

        let replacement = if self.mint_replacement_on_redeem {
            Some(RedeemableCode::new(generate_code()?))
        } else {
            None
        };

        self.code_repo
            .redeem(code, username, replacement.as_ref())
            .await?;
        info!("code {} redeemed by {}", code, username);

        let event = NotificationEvent::redeemed(code, username);
        if let Err(e) = self.sink.notify(&event).await {
            warn!("notification sink failed for redemption: {:?}", e);
        }

        Ok(replacement.map(|c| c.code))
    }
}
