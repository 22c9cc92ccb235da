//! Managed record entries
//!
//! An [`Entry`] is the in-memory view of one managed DNS record. It starts
//! out holding only the configured domain (and whatever attributes the
//! configuration already knows) and is enriched in place by a provider's
//! resolution pass.
//!
//! ## Merge policy
//!
//! Hydration from provider data follows [`Entry::hydrate`]:
//!
//! | field         | behavior                                  |
//! |---------------|-------------------------------------------|
//! | `record_id`   | filled only while empty                   |
//! | `record_type` | filled only while empty                   |
//! | `ttl`         | filled only while `0`                     |
//! | `proxied`     | always overwritten (no "unset" sentinel)  |
//! | `address`     | always overwritten by the hydration pass  |
//!
//! `zone_id` is written by the zone lookup, again only while empty.

use crate::config::RecordConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Address value meaning "track the host's current public IP"
pub const PUBLIC_ADDRESS: &str = "public";

/// Attributes of a DNS record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttributes {
    /// Provider-assigned record identifier
    pub id: String,
    /// Record type (e.g. "A", "AAAA")
    pub record_type: String,
    /// Current record content
    pub address: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Provider proxy flag
    pub proxied: bool,
}

/// In-memory representation of one managed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Fully-qualified record name; the cache key
    domain: String,

    /// Current known address. After hydration this is what the provider
    /// reports; the update executor sets it to the desired value right
    /// before issuing an update.
    pub address: String,

    /// Provider-assigned record identifier, empty until resolved
    pub record_id: String,

    /// Provider-assigned zone identifier, empty until resolved
    pub zone_id: String,

    /// Record type, empty until resolved
    pub record_type: String,

    /// Provider proxy flag; refreshed on every resolution pass
    pub proxied: bool,

    /// Time-to-live in seconds, `0` until resolved
    pub ttl: u32,

    /// When the last hydration pass completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an entry with only the domain and configured address set
    pub fn new(domain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            address: address.into(),
            record_id: String::new(),
            zone_id: String::new(),
            record_type: String::new(),
            proxied: false,
            ttl: 0,
            resolved_at: None,
        }
    }

    /// Create an entry from configuration, seeding any attributes the
    /// configuration already knows
    pub fn from_config(config: &RecordConfig) -> Self {
        let mut entry = Self::new(config.name.clone(), config.address.clone());
        if let Some(zone_id) = &config.zone_id {
            entry.zone_id = zone_id.clone();
        }
        if let Some(record_id) = &config.record_id {
            entry.record_id = record_id.clone();
        }
        if let Some(record_type) = &config.record_type {
            entry.record_type = record_type.clone();
        }
        if let Some(ttl) = config.ttl {
            entry.ttl = ttl;
        }
        entry
    }

    /// The record name this entry manages
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether both provider identifiers are known
    pub fn is_resolved(&self) -> bool {
        !self.zone_id.is_empty() && !self.record_id.is_empty()
    }

    /// Fill the zone identifier if it is not yet known
    ///
    /// Returns `true` if the value was taken.
    pub fn fill_zone_id(&mut self, zone_id: impl Into<String>) -> bool {
        if self.zone_id.is_empty() {
            self.zone_id = zone_id.into();
            true
        } else {
            false
        }
    }

    /// Merge provider-reported attributes into this entry
    ///
    /// See the module documentation for the per-field policy.
    pub fn hydrate(&mut self, record: RecordAttributes) {
        if self.record_id.is_empty() {
            self.record_id = record.id;
        }
        if self.record_type.is_empty() {
            self.record_type = record.record_type;
        }
        if self.ttl == 0 {
            self.ttl = record.ttl;
        }
        self.proxied = record.proxied;
        self.address = record.address;
        self.resolved_at = Some(Utc::now());
    }

    /// Drop the cached record identifier after the provider confirmed it
    /// no longer exists, so the next pass rediscovers the record by name
    pub fn forget_record_id(&mut self) {
        self.record_id.clear();
    }
}
