//! HTTP client abstraction for outbound webhook calls.
//!
//! The indirection exists so the notification sink can be exercised in
//! tests without real network requests, and so the timeout policy for
//! external collaborators lives in one place.

use std::time::Duration;
use async_trait::async_trait;
use crate::Error;

/// A generic trait for posting JSON payloads.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    /// `timeout` bounds the full request; external collaborators never
    /// get to stall a caller indefinitely.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), Error> {
        self.client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
