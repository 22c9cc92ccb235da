// # Cloudflare DNS Provider
//
// Cloudflare API v4 implementation of `recordkeeper_core::DnsProvider`.
//
// ## Behavior
//
// - Zones are found by scanning `GET /zones?page=n` for the candidate zone
//   name (last two labels of the domain)
// - Records are found by scanning `GET /zones/:zone_id/dns_records?page=n`,
//   matching a cached record id when one is known and the name otherwise
// - Updates are a single `PUT /zones/:zone_id/dns_records/:record_id`
// - Every response is decoded into a typed envelope; a listing that reports
//   `success: false` is a provider error, an update that does so is `Ok(false)`
//
// The provider keeps no state between calls. Retries, scheduling and the
// identifier cache all belong to the engine.
//
// ## Security
//
// - The API key never appears in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

mod auth;
mod wire;

pub use auth::{Credentials, SERVICE_KEY_USERNAME};

use async_trait::async_trait;
use recordkeeper_core::config::ProviderConfig;
use recordkeeper_core::traits::{DnsProvider, DnsProviderFactory};
use recordkeeper_core::{Entry, Error, ProviderRegistry, RecordAttributes, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use wire::{DnsRecord, ListEnvelope, ObjectEnvelope, UpdateRecordBody, Zone};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "cloudflare";

/// Derive the zone name a domain is assumed to live in
///
/// Takes the last two dot-separated labels, so `home.example.com` maps to
/// `example.com`. Multi-label public suffixes are not recognised:
/// `sub.example.co.uk` maps to `co.uk`. A domain with fewer than two labels
/// is its own candidate.
pub fn candidate_zone_name(domain: &str) -> String {
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        return domain.to_string();
    }
    labels[labels.len() - 2..].join(".")
}

/// Cloudflare DNS provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct CloudflareProvider {
    credentials: Credentials,

    /// API root, without a trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a provider talking to the public Cloudflare API
    ///
    /// # Errors
    ///
    /// `Error::Transport` if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Find the identifier of the zone that owns `domain`
    ///
    /// ```http
    /// GET /zones?page=n
    /// ```
    pub async fn zone_id_for(&self, domain: &str) -> Result<String> {
        let candidate = candidate_zone_name(domain);
        tracing::debug!("Looking up zone {} for {}", candidate, domain);

        let zone: Option<Zone> = self
            .scan("/zones", |zone: &Zone| zone.name == candidate)
            .await?;

        match zone {
            Some(zone) => {
                tracing::debug!("Found zone ID {} for {}", zone.id, candidate);
                Ok(zone.id)
            }
            None => Err(Error::lookup(format!(
                "Zone not found: {} (for {})",
                candidate, domain
            ))),
        }
    }

    /// Fetch the current attributes of a record
    ///
    /// A non-empty `record_id` is matched by id; otherwise the record is
    /// found by name among the `A` and `AAAA` records. Other record types
    /// sharing the name are never matched.
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=n
    /// ```
    pub async fn find_record(
        &self,
        zone_id: &str,
        record_id: &str,
        domain: &str,
    ) -> Result<RecordAttributes> {
        tracing::debug!("Looking up record {} in zone {}", domain, zone_id);

        let path = format!("/zones/{}/dns_records", zone_id);
        let record: Option<DnsRecord> = self
            .scan(&path, |record: &DnsRecord| {
                if record_id.is_empty() {
                    record.name == domain && record.is_address_record()
                } else {
                    record.id == record_id
                }
            })
            .await?;

        match record {
            Some(record) => Ok(record.into()),
            None if record_id.is_empty() => Err(Error::lookup(format!(
                "DNS record not found: {} in zone {}",
                domain, zone_id
            ))),
            None => Err(Error::lookup(format!(
                "DNS record not found: {} (id {}) in zone {}",
                domain, record_id, zone_id
            ))),
        }
    }

    /// Walk a paginated listing until `matches` accepts an item
    ///
    /// Stops on the first match. Returns `Ok(None)` once the last page
    /// reported by `result_info` has been scanned.
    async fn scan<T, F>(&self, path: &str, mut matches: F) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
        F: FnMut(&T) -> bool + Send,
    {
        let mut page: u32 = 1;
        loop {
            let url = format!("{}{}?page={}", self.base_url, path, page);
            tracing::debug!("Listing {} page {}", path, page);
            let response = self
                .request(self.client.get(&url))
                .send()
                .await
                .map_err(|e| Error::transport(format!("GET {} failed: {}", path, e)))?;

            let envelope: ListEnvelope<T> = decode(response).await?;
            if !envelope.success {
                return Err(Error::provider(
                    PROVIDER_NAME,
                    format!("Listing {} failed: {}", path, envelope.error_summary()),
                ));
            }

            let total_pages = envelope.total_pages();
            if let Some(found) = envelope.into_items().into_iter().find(|item| matches(item)) {
                return Ok(Some(found));
            }
            if page >= total_pages {
                return Ok(None);
            }
            page += 1;
        }
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        self.credentials
            .apply(request)
            .header("X-Content-Type", "application/json")
    }
}

/// Decode a response body into `T`
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::transport(format!("Failed to read response body: {}", e)))?;

    serde_json::from_slice(&body).map_err(|e| {
        Error::decode(format!(
            "Unexpected response body (HTTP {}): {}",
            status.as_u16(),
            e
        ))
    })
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn resolve(&self, entry: &mut Entry) -> Result<()> {
        if entry.zone_id.is_empty() {
            let zone_id = self.zone_id_for(entry.domain()).await?;
            entry.fill_zone_id(zone_id);
        }

        let record = self
            .find_record(&entry.zone_id, &entry.record_id, entry.domain())
            .await?;
        entry.hydrate(record);
        Ok(())
    }

    /// Send one update carrying the entry's attributes with `address`
    ///
    /// An entry missing either identifier is resolved first.
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn set_address(&self, address: &str, entry: &mut Entry) -> Result<bool> {
        if !entry.is_resolved() {
            self.resolve(entry).await?;
        }
        entry.address = address.to_string();

        let path = format!("/zones/{}/dns_records/{}", entry.zone_id, entry.record_id);
        let url = format!("{}{}", self.base_url, path);
        let body = UpdateRecordBody::from(&*entry);

        tracing::debug!("Updating {} to {}", entry.domain(), address);

        let response = self
            .request(self.client.put(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("PUT {} failed: {}", path, e)))?;

        let envelope: ObjectEnvelope<DnsRecord> = decode(response).await?;
        if envelope.success {
            tracing::debug!("Cloudflare accepted update for {}", entry.domain());
        } else {
            tracing::warn!(
                "Cloudflare refused update for {}: {}",
                entry.domain(),
                envelope.error_summary()
            );
        }
        Ok(envelope.success)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating CloudflareProvider instances
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let credentials = Credentials::from_pair(&config.username, config.auth_token.clone());
        Ok(Box::new(CloudflareProvider::new(credentials, timeout)?))
    }
}

/// Register the Cloudflare provider with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(CloudflareFactory));
}
