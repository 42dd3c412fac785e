// File: keyledger-core/src/services/credential_service.rs

use std::sync::Arc;
use tracing::info;

use crate::Error;
use keyledger_common::traits::repository_traits::AdminCredentialRepository;

/// Thin front over the credential store. Provisioning new admins is a
/// manual operation and deliberately has no surface here.
pub struct CredentialService {
    credential_repo: Arc<dyn AdminCredentialRepository>,
}

impl CredentialService {
    pub fn new(credential_repo: Arc<dyn AdminCredentialRepository>) -> Self {
        Self { credential_repo }
    }

    /// Unknown or revoked keys are a `false`, not an error.
    pub async fn validate(&self, key: &str) -> Result<bool, Error> {
        self.credential_repo.validate(key).await
    }

    pub async fn revoke(&self, key: &str) -> Result<(), Error> {
        self.credential_repo.revoke(key).await?;
        info!("admin credential revoked");
        Ok(())
    }
}
