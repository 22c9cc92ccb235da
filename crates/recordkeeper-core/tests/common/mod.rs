//! Test doubles and common utilities for engine contract tests
//!
//! The mock provider keeps a table of "remote" records and follows the
//! DnsProvider contract (trusted identifiers, merge-on-hydrate, one update
//! per call) without any network I/O.

#![allow(dead_code)]

use recordkeeper_core::config::{ProviderConfig, RecordConfig, RecordkeeperConfig};
use recordkeeper_core::error::{Error, Result};
use recordkeeper_core::traits::{DnsProvider, IpSource};
use recordkeeper_core::{Entry, RecordAttributes};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Zone id the mock provider assigns to every record
pub const MOCK_ZONE_ID: &str = "Z1";

/// An IP source returning a fixed address and counting calls
pub struct ControlledIpSource {
    current_ip: IpAddr,
    call_count: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl ControlledIpSource {
    pub fn new(current_ip: IpAddr) -> Self {
        Self {
            current_ip,
            call_count: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Make subsequent lookups fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Create a new ControlledIpSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            current_ip: other.current_ip,
            call_count: Arc::clone(&other.call_count),
            failing: Arc::clone(&other.failing),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ControlledIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::ip_source("lookup service unavailable"));
        }
        Ok(self.current_ip)
    }

    fn source_name(&self) -> &'static str {
        "controlled"
    }
}

/// One update call observed by the mock provider
#[derive(Debug, Clone)]
pub struct UpdateCall {
    pub address: String,
    pub entry: Entry,
}

#[derive(Default)]
struct MockState {
    remote: HashMap<String, RecordAttributes>,
    transport_failures: HashSet<String>,
    updates: Vec<UpdateCall>,
}

/// A mock DnsProvider that tracks calls
pub struct MockDnsProvider {
    state: Arc<Mutex<MockState>>,
    resolve_call_count: Arc<AtomicUsize>,
    zone_lookup_count: Arc<AtomicUsize>,
    accept_updates: Arc<AtomicBool>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
            zone_lookup_count: Arc::new(AtomicUsize::new(0)),
            accept_updates: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Add (or replace) a remote A record
    pub fn with_record(self, domain: &str, id: &str, address: &str) -> Self {
        self.put_record(
            domain,
            RecordAttributes {
                id: id.to_string(),
                record_type: "A".to_string(),
                address: address.to_string(),
                ttl: 300,
                proxied: false,
            },
        );
        self
    }

    /// Add (or replace) a remote record
    pub fn put_record(&self, domain: &str, record: RecordAttributes) {
        self.state
            .lock()
            .unwrap()
            .remote
            .insert(domain.to_string(), record);
    }

    /// Remove a remote record
    pub fn remove_record(&self, domain: &str) {
        self.state.lock().unwrap().remote.remove(domain);
    }

    /// Current remote attributes of a record
    pub fn remote_record(&self, domain: &str) -> Option<RecordAttributes> {
        self.state.lock().unwrap().remote.get(domain).cloned()
    }

    /// Make every call for `domain` fail with a transport error
    pub fn fail_transport_for(&self, domain: &str) {
        self.state
            .lock()
            .unwrap()
            .transport_failures
            .insert(domain.to_string());
    }

    /// Make the provider answer updates with `success: false`
    pub fn set_accept_updates(&self, accept: bool) {
        self.accept_updates.store(accept, Ordering::SeqCst);
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of zone discoveries performed
    pub fn zone_lookup_count(&self) -> usize {
        self.zone_lookup_count.load(Ordering::SeqCst)
    }

    /// Get the list of update calls
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
            resolve_call_count: Arc::clone(&other.resolve_call_count),
            zone_lookup_count: Arc::clone(&other.zone_lookup_count),
            accept_updates: Arc::clone(&other.accept_updates),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve(&self, entry: &mut Entry) -> Result<()> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();

        if state.transport_failures.contains(entry.domain()) {
            return Err(Error::transport("connection reset"));
        }

        if entry.zone_id.is_empty() {
            self.zone_lookup_count.fetch_add(1, Ordering::SeqCst);
            entry.fill_zone_id(MOCK_ZONE_ID);
        }

        let record = state
            .remote
            .get(entry.domain())
            .filter(|r| entry.record_id.is_empty() || r.id == entry.record_id)
            .cloned()
            .ok_or_else(|| Error::lookup(format!("record {}", entry.domain())))?;

        entry.hydrate(record);
        Ok(())
    }

    async fn set_address(&self, address: &str, entry: &mut Entry) -> Result<bool> {
        entry.address = address.to_string();

        let mut state = self.state.lock().unwrap();
        if state.transport_failures.contains(entry.domain()) {
            return Err(Error::transport("connection reset"));
        }

        state.updates.push(UpdateCall {
            address: address.to_string(),
            entry: entry.clone(),
        });

        let accepted = self.accept_updates.load(Ordering::SeqCst);
        if accepted {
            if let Some(record) = state.remote.get_mut(entry.domain()) {
                record.address = address.to_string();
            }
        }
        Ok(accepted)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal single-pass config for the given records
pub fn minimal_config(records: Vec<RecordConfig>) -> RecordkeeperConfig {
    RecordkeeperConfig {
        provider: ProviderConfig::new("mock", "ops@example.com", "test-key"),
        interval: 0,
        records,
        ..RecordkeeperConfig::default()
    }
}
