// src/lib.rs

pub mod db;
pub mod http;
pub mod repositories;
pub mod services;
pub mod test_utils;

pub use db::Database;
pub use keyledger_common::error::Error;
pub use http::{DefaultHttpClient, HttpClient};
