//! Shared HTTP client.
//!
//! The pipeline is synchronous; network calls run on a private
//! current-thread tokio runtime owned by this client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

/// Default HTTP timeout (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking facade over an async `reqwest` client.
///
/// `timeout` bounds connecting and each read, never a whole transfer, so a
/// slow but steady download is not cut off. Short API calls that need a total
/// cap set it per request with [`RequestBuilder::timeout`](reqwest::RequestBuilder::timeout).
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    runtime: Arc<tokio::runtime::Runtime>,
    timeout: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpClient {
    /// Create a client that fails when connecting or a read stalls for `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::from_builder(reqwest::Client::builder(), timeout)
    }

    /// Client that ignores proxy settings from the environment.
    #[cfg(test)]
    pub(crate) fn direct(timeout: Duration) -> anyhow::Result<Self> {
        Self::from_builder(reqwest::Client::builder().no_proxy(), timeout)
    }

    fn from_builder(builder: reqwest::ClientBuilder, timeout: Duration) -> anyhow::Result<Self> {
        let client = builder
            .user_agent(concat!("packsync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        Ok(Self {
            client,
            runtime: Arc::new(runtime),
            timeout,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Drive a request future to completion on the client's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
