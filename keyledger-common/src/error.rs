// ================================================================
// File: keyledger-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("Uuid error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Unauthorized: invalid or revoked admin key")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already redeemed: {0}")]
    AlreadyRedeemed(String),

    #[error("Already validated: {0}")]
    AlreadyValidated(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// True for infrastructure failures the caller may retry with backoff.
    /// Every state-mutating update is conditional on current status, so a
    /// retried mutation lands on Conflict instead of double-applying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Database(_)
                | Error::Http(_)
                | Error::Io(_)
                | Error::Migration(_)
                | Error::Timeout(_)
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
