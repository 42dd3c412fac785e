// File: keyledger-core/src/test_utils/helpers.rs

use sqlx::{Pool, Postgres, PgConnection, Connection};
use sqlx::postgres::PgPoolOptions;
use crate::Error;
use crate::db::Database;

/// Create the test database if it does not exist yet.
pub async fn ensure_test_database_exists() -> Result<(), Error> {
    // Connect to the "postgres" database as an admin or superuser.
    // Adjust username/host as needed for your environment:
    let admin_url = std::env::var("DATABASE_ADMIN_URL")
        .unwrap_or_else(|_| "postgres://keyledger@localhost/postgres".to_string());

    let mut conn = PgConnection::connect(&admin_url).await?;

    let test_db = "keyledger_test";

    // `CREATE DATABASE IF NOT EXISTS` is non-standard, so try and ignore
    // the duplicate error instead:
    let create_db_sql = format!("CREATE DATABASE {test_db};");
    match sqlx::query(&create_db_sql).execute(&mut conn).await {
        Ok(_) => {
            println!("Created test DB '{test_db}'.");
        }
        Err(e) => {
            // 42P04 => "duplicate_database"
            if let Some(db_err) = e.as_database_error() {
                if let Some(code) = db_err.code() {
                    if code == "42P04" {
                        println!("Test DB '{test_db}' already exists; ignoring.");
                    } else {
                        return Err(Error::Database(e));
                    }
                } else {
                    return Err(Error::Database(e));
                }
            } else {
                return Err(Error::Database(e));
            }
        }
    }

    Ok(())
}

/// Create a connection pool to the test DB.
/// By default looks for `TEST_DATABASE_URL` in env,
/// else uses `postgres://keyledger@localhost/keyledger_test`.
pub async fn create_test_db_pool() -> Result<Pool<Postgres>, Error> {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://keyledger@localhost/keyledger_test".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    Ok(pool)
}

/// Wipes out test data so each test can start fresh.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(r#"
        TRUNCATE TABLE
            admin_credentials,
            redeemable_codes,
            purchases,
            users
        RESTART IDENTITY CASCADE;
    "#)
        .execute(pool)
        .await?;

    Ok(())
}

/// Returns a migrated, empty test DB handle.
pub async fn setup_test_database() -> Result<Database, Error> {
    // 1) Make sure the test database exists:
    ensure_test_database_exists().await?;

    // 2) Now connect to `keyledger_test` and run migrations/clean:
    let pool = create_test_db_pool().await?;
    let db = Database::from_pool(pool);
    db.migrate().await?;
    clean_database(db.pool()).await?;

    Ok(db)
}
