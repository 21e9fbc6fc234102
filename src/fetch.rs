//! Outbound HTTP GET used to fill the content cache
//!
//! The [`Fetcher`] trait is the seam between the cache and the network. The
//! production implementation is [`HttpFetcher`], a thin wrapper over a
//! `reqwest::Client` with a bounded request timeout.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

/// Default upper bound on a single GET, in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while fetching a URL
///
/// Every variant is a transport-level failure from the cache's point of view:
/// the cache recovers from all of them by falling back to stored content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection could not be established or was reset
    #[error("connection failed: {0}")]
    Connect(String),

    /// Request did not complete within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Any other transport failure (body read, redirect loop, ...)
    #[error("HTTP request failed: {0}")]
    Transport(String),
}

/// A source of raw response bodies keyed by URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a single GET and returns the response body
    async fn get(&self, url: &str) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        (**self).get(url).await
    }
}

/// Fetches URLs over HTTP using reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, timeout))
    }

    /// Creates a fetcher around an existing client
    ///
    /// `timeout` is only reported in [`FetchError::Timeout`]; the client's own
    /// timeout settings govern the request.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.classify(e))?;

        response.bytes().await.map_err(|e| self.classify(e))
    }
}
