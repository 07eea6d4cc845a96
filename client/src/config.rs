//! Client configuration.

use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval of the self-destruct poller
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Where the store lives and how the client talks to it
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Store API base URL
    pub base_url: Url,

    /// Public origin share links are built on (the viewer's site)
    pub origin: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Self-destruct poll interval
    pub cleanup_interval: Duration,
}

impl ClientConfig {
    /// Config with default timeouts.
    pub fn new(base_url: &str, origin: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Validation(format!("invalid store URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Validation("store URL must be http(s)".to_string()));
        }

        Ok(Self {
            base_url,
            origin: origin.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
