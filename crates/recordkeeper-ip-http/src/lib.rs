// # HTTP IP Source
//
// Looks up the host's public address from a plain-text HTTP service such as
// `https://api.ipify.org`.
//
// ## Behavior
//
// - One GET per call to `current()`; nothing is cached
// - The body is trimmed and parsed as an IPv4 or IPv6 address
// - Any failure (network, non-2xx status, unparsable body) is
//   `Error::IpSource`

use recordkeeper_core::config::IpLookupConfig;
use recordkeeper_core::traits::IpSource;
use recordkeeper_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default timeout for a single lookup (10 seconds)
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public address lookup
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL returning the caller's address as plain text
    /// - `timeout`: Timeout for each lookup
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ip_source(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source from the `ip_lookup` configuration section
    pub fn from_config(config: &IpLookupConfig) -> Result<Self> {
        Self::new(config.url.clone(), DEFAULT_LOOKUP_TIMEOUT)
    }

    /// The lookup URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} answered HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        let text = body.trim();
        let ip: IpAddr = text
            .parse()
            .map_err(|_| Error::ip_source(format!("Invalid IP address: {:?}", text)))?;

        tracing::debug!("Public address from {}: {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
