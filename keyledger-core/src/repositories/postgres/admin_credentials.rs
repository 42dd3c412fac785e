// File: keyledger-core/src/repositories/postgres/admin_credentials.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use keyledger_common::error::Error;
use keyledger_common::models::credential::AdminCredential;
use keyledger_common::traits::repository_traits::AdminCredentialRepository;

#[derive(Clone)]
pub struct PostgresAdminCredentialRepository {
    pool: Pool<Postgres>,
}

impl PostgresAdminCredentialRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminCredentialRepository for PostgresAdminCredentialRepository {
    async fn validate(&self, key: &str) -> Result<bool, Error> {
        let row = sqlx::query(
            r#"
            SELECT key
            FROM admin_credentials
            WHERE key = $1
              AND status = 'active'
            "#,
        )
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        if row.is_none() {
            debug!("admin key validation failed (unknown or revoked)");
            return Ok(false);
        }

        // Touch is best-effort; concurrent validates may overwrite each
        // other's timestamp and that is acceptable.
        sqlx::query(
            r#"
            UPDATE admin_credentials
            SET last_used_at = $1
            WHERE key = $2
            "#,
        )
            .bind(Utc::now())
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    async fn revoke(&self, key: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE admin_credentials
            SET status = 'revoked'
            WHERE key = $1
            "#,
        )
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<AdminCredential>, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                key,
                status,
                created_at,
                last_used_at
            FROM admin_credentials
            WHERE key = $1
            "#,
        )
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(AdminCredential {
                key: r.try_get("key")?,
                status: r.try_get("status")?,
                created_at: r.try_get("created_at")?,
                last_used_at: r.try_get("last_used_at")?,
            }))
        } else {
            Ok(None)
        }
    }
}
