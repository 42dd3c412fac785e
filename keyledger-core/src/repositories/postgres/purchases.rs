// File: keyledger-core/src/repositories/postgres/purchases.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use keyledger_common::error::Error;
use keyledger_common::models::code::RedeemableCode;
use keyledger_common::models::purchase::Purchase;
use keyledger_common::traits::repository_traits::PurchaseRepository;

#[derive(Clone)]
pub struct PostgresPurchaseRepository {
    pool: Pool<Postgres>,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// After a conditional update hits zero rows, work out which terminal
    /// failure to report. The row either never existed or was validated
    /// by someone else first.
    async fn terminal_state_error(&self, purchase_id: &str) -> Error {
        match sqlx::query("SELECT status FROM purchases WHERE purchase_id = $1")
            .bind(purchase_id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(_)) => Error::AlreadyValidated(purchase_id.to_string()),
            Ok(None) => Error::NotFound(format!("purchase '{}'", purchase_id)),
            Err(e) => Error::Database(e),
        }
    }

    fn row_to_purchase(r: &sqlx::postgres::PgRow) -> Result<Purchase, Error> {
        Ok(Purchase {
            purchase_id: r.try_get("purchase_id")?,
            buyer_email: r.try_get("buyer_email")?,
            amount_cents: r.try_get("amount_cents")?,
            payment_ref: r.try_get("payment_ref")?,
            status: r.try_get("status")?,
            issued_code: r.try_get("issued_code")?,
            rejection_reason: r.try_get("rejection_reason")?,
            created_at: r.try_get("created_at")?,
            validated_at: r.try_get("validated_at")?,
        })
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn create(&self, purchase: &Purchase) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO purchases (
                purchase_id,
                buyer_email,
                amount_cents,
                payment_ref,
                status,
                issued_code,
                rejection_reason,
                created_at,
                validated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
            .bind(&purchase.purchase_id)
            .bind(&purchase.buyer_email)
            .bind(purchase.amount_cents)
            .bind(&purchase.payment_ref)
            .bind(purchase.status)
            .bind(&purchase.issued_code)
            .bind(&purchase.rejection_reason)
            .bind(purchase.created_at)
            .bind(purchase.validated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, purchase_id: &str) -> Result<Option<Purchase>, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                purchase_id,
                buyer_email,
                amount_cents,
                payment_ref,
                status,
                issued_code,
                rejection_reason,
                created_at,
                validated_at
            FROM purchases
            WHERE purchase_id = $1
            "#,
        )
            .bind(purchase_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_purchase(&r)?)),
            None => Ok(None),
        }
    }

    async fn approve(
        &self,
        purchase_id: &str,
        code: &RedeemableCode,
        validated_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO redeemable_codes (code, status, created_at, redeemed_by, redeemed_at)
            VALUES ($1, $2, $3, NULL, NULL)
            "#,
        )
            .bind(&code.code)
            .bind(code.status)
            .bind(code.created_at)
            .execute(&mut *tx)
            .await?;

        let flipped = sqlx::query(
            r#"
            UPDATE purchases
            SET status = 'approved',
                issued_code = $1,
                validated_at = $2
            WHERE purchase_id = $3
              AND status = 'pending'
            "#,
        )
            .bind(&code.code)
            .bind(validated_at)
            .bind(purchase_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if flipped == 0 {
            // Rolling back also discards the code inserted above, so a
            // lost race never strands an orphaned active code.
            tx.rollback().await?;
            return Err(self.terminal_state_error(purchase_id).await);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reject(
        &self,
        purchase_id: &str,
        reason: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let flipped = sqlx::query(
            r#"
            UPDATE purchases
            SET status = 'rejected',
                rejection_reason = $1,
                validated_at = $2
            WHERE purchase_id = $3
              AND status = 'pending'
            "#,
        )
            .bind(reason)
            .bind(validated_at)
            .bind(purchase_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if flipped == 0 {
            return Err(self.terminal_state_error(purchase_id).await);
        }

        Ok(())
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<Purchase>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT
                purchase_id,
                buyer_email,
                amount_cents,
                payment_ref,
                status,
                issued_code,
                rejection_reason,
                created_at,
                validated_at
            FROM purchases
            WHERE status = 'pending'
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(Self::row_to_purchase(&r)?);
        }
        Ok(list)
    }
}
