//! HTTP transport backed by `reqwest`.

use async_trait::async_trait;
use futures::StreamExt;
use idsweep_types::{ItemError, ProbeResult, SweepConfig};
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use std::path::Path;
use std::time::Duration;

use crate::{Transport, write_body};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Expected number of concurrent requests; sizes the idle connection pool.
    pub concurrency: usize,
    /// Bound on a whole probe request, and on each read while streaming a body.
    pub timeout: Duration,
    /// Connection timeout (separate from request timeout).
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: idsweep_types::DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("idsweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Derives transport settings from a run configuration.
    #[must_use]
    pub fn from_sweep(config: &SweepConfig) -> Self {
        Self {
            concurrency: config.max_concurrent_downloads,
            timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            ..Default::default()
        }
    }
}

/// HTTP transport with connection pooling and bounded waits.
///
/// Probes use `HEAD` and are bounded as a whole by [`ClientConfig::timeout`].
/// Downloads use `GET`; since bodies may be large, the same duration bounds
/// each read rather than the whole transfer, so a stalled server still fails
/// the item.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Creates a new transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            // Keep one idle connection per worker
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .read_timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self, url: &str) -> ProbeResult {
        let response = self
            .client
            .head(url)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItemError::Status {
                status: status.as_u16(),
            });
        }

        content_length(response.headers()).ok_or(ItemError::MissingContentLength)
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, ItemError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        // Checked before the destination is created, so nothing is left behind
        let status = response.status();
        if !status.is_success() {
            return Err(ItemError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(classify_reqwest_error));
        write_body(body, destination).await
    }
}

/// Reads the declared body length from response headers.
///
/// The header map is used rather than the body size hint, which is empty for
/// `HEAD` responses.
#[must_use]
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Maps a `reqwest` error onto the item error taxonomy.
#[must_use]
pub fn classify_reqwest_error(error: reqwest::Error) -> ItemError {
    if error.is_timeout() {
        return ItemError::Timeout;
    }
    if let Some(status) = error.status() {
        return ItemError::Status {
            status: status.as_u16(),
        };
    }

    // reqwest's own message omits the cause (DNS, refused, reset)
    let mut message = error.to_string();
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ItemError::Transport(message)
}
