// src/repositories/postgres/mod.rs

pub mod admin_credentials;
pub mod purchases;
pub mod redeemable_codes;
pub mod users;

pub use admin_credentials::PostgresAdminCredentialRepository;
pub use purchases::PostgresPurchaseRepository;
pub use redeemable_codes::PostgresRedeemableCodeRepository;
pub use users::PostgresUserRepository;

/// Postgres unique_violation, the signal that a freshly generated code
/// collided and the mint should be retried.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
        }
        _ => false,
    }
}
