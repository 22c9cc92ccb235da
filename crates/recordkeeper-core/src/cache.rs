// # Entry Cache
//
// Process-lifetime store mapping a domain to its last-known Entry.
//
// ## Purpose
//
// Zone and record identifiers are expensive to derive (each costs one or
// more paginated listing calls), so the first successful resolution is
// kept here and trusted on every later pass.
//
// ## Ownership
//
// The cache is owned by the reconciliation engine and only touched from
// its single flow of control, so it needs no locking. Nothing is
// persisted: a restart starts from configuration again.

use std::collections::HashMap;

use crate::config::RecordConfig;
use crate::entry::Entry;

/// In-memory entry cache
///
/// Entries are checked out (cloned) at the start of a domain's pass and
/// written back when the pass ends, whether it succeeded or not, so that
/// identifiers discovered before a failure are kept.
///
/// # Example
///
/// ```rust
/// use recordkeeper_core::cache::EntryCache;
/// use recordkeeper_core::config::RecordConfig;
///
/// let mut cache = EntryCache::new();
/// let config = RecordConfig::new("home.example.com");
///
/// let mut entry = cache.checkout(&config);
/// entry.zone_id = "Z1".to_string();
/// cache.store(entry);
///
/// assert_eq!(cache.get("home.example.com").unwrap().zone_id, "Z1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntryCache {
    entries: HashMap<String, Entry>,
}

impl EntryCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with one entry per configured record
    pub fn from_records(records: &[RecordConfig]) -> Self {
        let entries = records
            .iter()
            .map(|record| (record.name.clone(), Entry::from_config(record)))
            .collect();
        Self { entries }
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the cached entry for a domain
    pub fn get(&self, domain: &str) -> Option<&Entry> {
        self.entries.get(domain)
    }

    /// Take a working copy of the entry for a configured record,
    /// creating it from configuration on first use
    pub fn checkout(&mut self, record: &RecordConfig) -> Entry {
        self.entries
            .entry(record.name.clone())
            .or_insert_with(|| Entry::from_config(record))
            .clone()
    }

    /// Write an entry back, replacing the cached copy for its domain
    pub fn store(&mut self, entry: Entry) {
        self.entries.insert(entry.domain().to_string(), entry);
    }

    /// List the cached domains
    pub fn domains(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
