//! Remote listing client and connectivity probe.

use std::time::Duration;

use crate::config::ApiConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// Builds the HTTP client shared by listing requests and the probe.
fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .build()
}

/// Client for the folder listing endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Creates a client for the endpoint described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            config,
        })
    }

    /// Returns the endpoint configuration.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Lists the entries below `prefix`, or the root when `prefix` is empty.
    ///
    /// Entries come back in server order and unfiltered; callers drop
    /// sentinel markers with [`crate::entry::children_of`].
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout, a non-success status or
    /// a body that is not a JSON array of entries.
    pub async fn fetch_files(&self, prefix: &str) -> Result<Vec<Entry>> {
        let mut request = self
            .http
            .get(&self.config.url)
            .timeout(self.config.listing_timeout());
        if !prefix.is_empty() {
            request = request.query(&[("prefix", prefix)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }

        let entries: Vec<Entry> = response.json().await?;
        log::debug!("Listed {} entries under '{prefix}'", entries.len());
        Ok(entries)
    }

    /// Heuristic connectivity check against the probe host.
    ///
    /// Any failure (DNS, refusal, timeout) counts as offline. The listing
    /// endpoint itself may still be down when this returns `true`.
    pub async fn is_online(&self) -> bool {
        match self
            .http
            .get(&self.config.probe_url)
            .timeout(self.config.probe_timeout())
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Connectivity probe failed: {e}");
                false
            }
        }
    }
}
