//! Cloudflare API v4 wire types
//!
//! Every response is decoded once into a typed envelope and checked for
//! `success` before its payload is used.

use recordkeeper_core::{Entry, RecordAttributes};
use serde::{Deserialize, Serialize};

/// Envelope of a paginated listing call
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    /// `null` on failed calls
    pub result: Option<Vec<T>>,

    pub success: bool,

    #[serde(default)]
    pub errors: Vec<ApiMessage>,

    #[serde(default)]
    pub result_info: Option<PageInfo>,
}

impl<T> ListEnvelope<T> {
    /// Total number of pages; a missing `result_info` means one page
    pub fn total_pages(&self) -> u32 {
        self.result_info
            .as_ref()
            .map(|info| info.total_pages)
            .unwrap_or(1)
    }

    /// The page's items
    pub fn into_items(self) -> Vec<T> {
        self.result.unwrap_or_default()
    }

    /// Error messages joined for reporting
    pub fn error_summary(&self) -> String {
        summarize(&self.errors)
    }
}

/// Envelope of a single-object call (record update)
#[derive(Debug, Deserialize)]
pub struct ObjectEnvelope<T> {
    pub result: Option<T>,

    pub success: bool,

    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

impl<T> ObjectEnvelope<T> {
    /// Error messages joined for reporting
    pub fn error_summary(&self) -> String {
        summarize(&self.errors)
    }
}

/// An entry of the envelope's `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Pagination metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// A zone as returned by `GET /zones`
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A DNS record as returned by `GET /zones/:zone_id/dns_records`
#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(default)]
    pub zone_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub proxiable: bool,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub ttl: u32,
}

impl DnsRecord {
    /// Whether this is an `A` or `AAAA` record
    pub fn is_address_record(&self) -> bool {
        matches!(self.record_type.as_str(), "A" | "AAAA")
    }
}

impl From<DnsRecord> for RecordAttributes {
    fn from(record: DnsRecord) -> Self {
        RecordAttributes {
            id: record.id,
            record_type: record.record_type,
            address: record.content,
            ttl: record.ttl,
            proxied: record.proxied,
        }
    }
}

/// Body of `PUT /zones/:zone_id/dns_records/:record_id`
///
/// Mirrors the entry's public fields; identifiers travel in the path.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UpdateRecordBody<'a> {
    pub name: &'a str,
    pub content: &'a str,
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub proxied: bool,
    pub ttl: u32,
}

impl<'a> From<&'a Entry> for UpdateRecordBody<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            name: entry.domain(),
            content: &entry.address,
            record_type: &entry.record_type,
            proxied: entry.proxied,
            ttl: entry.ttl,
        }
    }
}

fn summarize(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}
