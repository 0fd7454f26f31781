//! The fetch boundary.
//!
//! Icon loading only needs GET-plus-text-body; anything that can do that
//! satisfies [`IconFetcher`]. The default implementation, [`HttpFetcher`],
//! wraps a shared `reqwest` client. Tests substitute scripted fetchers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::{IconError, Result};

/// A source of raw (unsanitized) icon bodies.
///
/// A non-2xx response must surface as a rejected future carrying the status,
/// never as a silent empty body.
pub trait IconFetcher: Send + Sync {
    /// Fetch the text body at `url`.
    fn fetch_text(&self, url: &str) -> BoxFuture<'static, Result<String>>;
}

/// Configuration for the default HTTP fetcher.
#[derive(Clone, Debug)]
pub struct HttpFetcherConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("glyphfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// [`IconFetcher`] backed by `reqwest`.
///
/// The underlying client is connection-pooling and cheap to clone; one
/// fetcher is typically shared by every loader and the prefetcher.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration.
    pub fn new() -> Self {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Create a fetcher from explicit configuration.
    pub fn with_config(config: HttpFetcherConfig) -> Self {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            // Building only fails on malformed TLS/proxy setup, which this
            // configuration cannot express.
            client: builder.build().unwrap_or_default(),
        }
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl IconFetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> BoxFuture<'static, Result<String>> {
        let client = self.client.clone();
        let url = url.to_string();

        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(IconError::from)?;

            let status = response.status();
            if !status.is_success() {
                return Err(IconError::http_status(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown status"),
                ));
            }

            response.text().await.map_err(IconError::from)
        }
        .boxed()
    }
}

impl IconFetcher for Arc<dyn IconFetcher> {
    fn fetch_text(&self, url: &str) -> BoxFuture<'static, Result<String>> {
        (**self).fetch_text(url)
    }
}
