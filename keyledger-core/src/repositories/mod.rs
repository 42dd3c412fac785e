// src/repositories/mod.rs

pub mod postgres;

pub use postgres::{
    PostgresAdminCredentialRepository,
    PostgresPurchaseRepository,
    PostgresRedeemableCodeRepository,
    PostgresUserRepository,
};
