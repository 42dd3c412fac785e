// File: keyledger-core/src/repositories/postgres/redeemable_codes.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use keyledger_common::error::Error;
use keyledger_common::models::code::RedeemableCode;
use keyledger_common::traits::repository_traits::RedeemableCodeRepository;

#[derive(Clone)]
pub struct PostgresRedeemableCodeRepository {
    pool: Pool<Postgres>,
}

impl PostgresRedeemableCodeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedeemableCodeRepository for PostgresRedeemableCodeRepository {
    async fn insert(&self, code: &RedeemableCode) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO redeemable_codes (
                code,
                status,
                created_at,
                redeemed_by,
                redeemed_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(&code.code)
            .bind(code.status)
            .bind(code.created_at)
            .bind(&code.redeemed_by)
            .bind(code.redeemed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Option<RedeemableCode>, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                code,
                status,
                created_at,
                redeemed_by,
                redeemed_at
            FROM redeemable_codes
            WHERE code = $1
            "#,
        )
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(RedeemableCode {
                code: r.try_get("code")?,
                status: r.try_get("status")?,
                created_at: r.try_get("created_at")?,
                redeemed_by: r.try_get("redeemed_by")?,
                redeemed_at: r.try_get("redeemed_at")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn redeem(
        &self,
        code: &str,
        redeemed_by: &str,
        replacement: Option<&RedeemableCode>,
    ) -> Result<(), Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The crux: the flip is one conditional update, so two concurrent
        // redemptions of the same code cannot both see rows_affected == 1.
        let flipped = sqlx::query(
            r#"
            UPDATE redeemable_codes
            SET status = 'redeemed',
                redeemed_by = $1,
                redeemed_at = $2
            WHERE code = $3
              AND status = 'active'
            "#,
        )
            .bind(redeemed_by)
            .bind(now)
            .bind(code)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if flipped == 0 {
            tx.rollback().await?;
            let existing = sqlx::query(
                "SELECT status FROM redeemable_codes WHERE code = $1",
            )
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
            return match existing {
                Some(_) => Err(Error::AlreadyRedeemed(code.to_string())),
                None => Err(Error::NotFound(format!("code '{}'", code))),
            };
        }

        // Attribution rides in the same transaction. is_premium_since is
        // kept from the first redemption if the user somehow redeems again
        // with a different code.
        sqlx::query(
            r#"
            INSERT INTO users (username, is_premium_since, redeemed_code, created_at)
            VALUES ($1, $2, $3, $2)
            ON CONFLICT (username) DO UPDATE
               SET is_premium_since = COALESCE(users.is_premium_since, EXCLUDED.is_premium_since),
                   redeemed_code    = EXCLUDED.redeemed_code
            "#,
        )
            .bind(redeemed_by)
            .bind(now)
            .bind(code)
            .execute(&mut *tx)
            .await?;

        if let Some(fresh) = replacement {
            sqlx::query(
                r#"
                INSERT INTO redeemable_codes (code, status, created_at, redeemed_by, redeemed_at)
                VALUES ($1, $2, $3, NULL, NULL)
                "#,
            )
                .bind(&fresh.code)
                .bind(fresh.status)
                .bind(fresh.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
