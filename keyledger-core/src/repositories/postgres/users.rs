// File: keyledger-core/src/repositories/postgres/users.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use keyledger_common::error::Error;
use keyledger_common::models::user::User;
use keyledger_common::traits::repository_traits::UserRepository;

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool<Postgres>,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, username: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                username,
                is_premium_since,
                redeemed_code,
                created_at
            FROM users
            WHERE username = $1
            "#,
        )
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(User {
                username: r.try_get("username")?,
                is_premium_since: r.try_get("is_premium_since")?,
                redeemed_code: r.try_get("redeemed_code")?,
                created_at: r.try_get("created_at")?,
            }))
        } else {
            Ok(None)
        }
    }
}
