//! Reconciliation engine
//!
//! The ReconcileEngine is responsible for:
//! - Determining each record's desired address (fixed or public)
//! - Hydrating cached entries through the DnsProvider
//! - Updating records whose provider address differs
//! - Reporting one outcome per record per pass
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │ ReconcileEngine  │
//!                 └──────────────────┘
//!                          │
//!      ┌───────────────────┼────────────────────┬──────────────────┐
//!      │                   │                    │                  │
//!      ▼                   ▼                    ▼                  ▼
//! ┌──────────┐     ┌──────────────┐     ┌──────────────┐    ┌────────────┐
//! │ IpSource │     │  EntryCache  │     │ DnsProvider  │    │   Events   │
//! │ (public) │     │ (checkout/   │     │ (resolve/    │    │  (notify)  │
//! └──────────┘     │  store)      │     │  set_address)│    └────────────┘
//!                  └──────────────┘     └──────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! For every configured record, in configuration order:
//!
//! 1. Work out the desired address
//! 2. Check the entry out of the cache and resolve it
//! 3. Compare the provider's address with the desired one
//! 4. Update if they differ
//! 5. Write the entry back and report the outcome
//!
//! A failure in any step skips that record for this pass only. Passes are
//! separated by the configured interval; the sleep is the only place a
//! shutdown signal is observed.

use crate::cache::EntryCache;
use crate::config::{RecordConfig, RecordkeeperConfig, Schedule};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Outcome of this pass's public address lookup, once attempted
type PublicLookup = Option<std::result::Result<String, String>>;

/// Events emitted by the ReconcileEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Engine started
    Started {
        records_count: usize,
    },

    /// A pass over all records began
    PassStarted {
        pass: u64,
    },

    /// Record already points at the desired address
    AlreadyCorrect {
        domain: String,
        address: String,
    },

    /// Record was updated
    Updated {
        domain: String,
        previous: String,
        address: String,
    },

    /// Provider answered the update but reported failure
    UpdateRejected {
        domain: String,
        current: String,
        desired: String,
    },

    /// Record skipped for this pass because of an error
    DomainSkipped {
        domain: String,
        error: String,
    },

    /// A pass over all records finished
    PassCompleted {
        pass: u64,
        updated: usize,
        failed: usize,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of reconciling one record in one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Provider address already equals the desired address; no update sent
    AlreadyCorrect { address: String },
    /// Update sent and accepted
    Updated { previous: String, address: String },
    /// Update sent and refused by the provider
    UpdateRejected { current: String, desired: String },
    /// Lookup, transport or decode error; retried next pass
    Skipped { error: String },
}

impl Outcome {
    /// Whether the record failed to reach its desired address
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::UpdateRejected { .. } | Outcome::Skipped { .. })
    }
}

/// Per-record entry of a [`PassReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: String,
    pub outcome: Outcome,
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone)]
pub struct PassReport {
    /// 1-based pass counter
    pub pass: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One report per configured record, in configuration order
    pub domains: Vec<DomainReport>,
}

impl PassReport {
    /// Number of records updated in this pass
    pub fn updated(&self) -> usize {
        self.domains
            .iter()
            .filter(|d| matches!(d.outcome, Outcome::Updated { .. }))
            .count()
    }

    /// Number of records that were rejected or skipped in this pass
    pub fn failed(&self) -> usize {
        self.domains.iter().filter(|d| d.outcome.is_failure()).count()
    }

    /// Outcome for a given record
    pub fn outcome(&self, domain: &str) -> Option<&Outcome> {
        self.domains
            .iter()
            .find(|d| d.domain == domain)
            .map(|d| &d.outcome)
    }
}

/// Core reconciliation engine
///
/// The engine owns the entry cache and drives one record at a time
/// through the provider. Nothing runs concurrently: a pass completes
/// before the inter-pass sleep begins, and a record completes before the
/// next one starts.
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcileEngine::new()`]
/// 2. Start with [`ReconcileEngine::run()`] (or drive passes manually
///    with [`ReconcileEngine::run_pass()`])
/// 3. Runs until the schedule is exhausted or a shutdown signal arrives
pub struct ReconcileEngine {
    /// DNS provider for resolving and updating records
    provider: Box<dyn DnsProvider>,

    /// Public address lookup
    ip_source: Box<dyn IpSource>,

    /// DNS records to keep, in configuration order
    records: Vec<RecordConfig>,

    /// Last-known state of every record
    cache: EntryCache,

    /// When passes run
    schedule: Schedule,

    /// Passes completed so far
    passes: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl ReconcileEngine {
    /// Create a new reconciliation engine
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `ip_source`: Public address lookup
    /// - `config`: recordkeeper configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        ip_source: Box<dyn IpSource>,
        config: RecordkeeperConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            provider,
            ip_source,
            cache: EntryCache::from_records(&config.records),
            schedule: config.schedule(),
            records: config.records,
            passes: 0,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Replace the schedule derived from configuration
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// The entry cache as of the last completed record
    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    /// Number of passes completed
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run the engine
    ///
    /// Runs passes on the configured schedule until the schedule is
    /// exhausted or Ctrl-C is received.
    pub async fn run(&mut self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Run the engine with an explicit shutdown signal
    ///
    /// With `Some(rx)`, the engine stops when `rx` resolves (a dropped
    /// sender counts as a signal). With `None`, it stops on Ctrl-C.
    /// Either way the signal is only observed during the inter-pass sleep;
    /// a pass in progress always completes.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(ReconcileEvent::Started {
            records_count: self.records.len(),
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            let report = self.run_pass().await;

            let interval = match self.schedule {
                Schedule::Once => {
                    info!("Single pass complete ({} failed)", report.failed());
                    self.emit_event(ReconcileEvent::Stopped {
                        reason: "Single pass complete".to_string(),
                    });
                    break;
                }
                Schedule::Every(interval) => interval,
            };

            if let Ok(delta) = chrono::Duration::from_std(interval) {
                debug!("Next pass at {}", report.finished_at + delta);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(ReconcileEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one reconciliation pass over every configured record
    ///
    /// Never fails: per-record errors are reported in the returned
    /// [`PassReport`] and the pass moves on to the next record.
    pub async fn run_pass(&mut self) -> PassReport {
        self.passes += 1;
        let pass = self.passes;
        let started_at = Utc::now();

        self.emit_event(ReconcileEvent::PassStarted { pass });
        debug!("Starting pass {} over {} record(s)", pass, self.records.len());

        // Looked up at most once per pass, on first need
        let mut public_address: PublicLookup = None;
        let mut domains = Vec::with_capacity(self.records.len());

        for index in 0..self.records.len() {
            let record = self.records[index].clone();
            let mut entry = self.cache.checkout(&record);

            let outcome = match self
                .reconcile_entry(&record, &mut entry, &mut public_address)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Skipping record {} this pass: {}", record.name, e);
                    Outcome::Skipped {
                        error: e.to_string(),
                    }
                }
            };

            self.cache.store(entry);
            self.report_outcome(&record.name, &outcome);
            domains.push(DomainReport {
                domain: record.name,
                outcome,
            });
        }

        let report = PassReport {
            pass,
            started_at,
            finished_at: Utc::now(),
            domains,
        };

        self.emit_event(ReconcileEvent::PassCompleted {
            pass,
            updated: report.updated(),
            failed: report.failed(),
        });

        report
    }

    /// Resolve, compare and (if needed) update a single entry
    async fn reconcile_entry(
        &self,
        record: &RecordConfig,
        entry: &mut Entry,
        public_address: &mut PublicLookup,
    ) -> Result<Outcome> {
        let desired = self.desired_address(record, public_address).await?;

        let had_record_id = !entry.record_id.is_empty();
        if let Err(e) = self.provider.resolve(entry).await {
            if e.is_lookup() && had_record_id && !entry.zone_id.is_empty() {
                // The provider no longer knows this record id; rediscover
                // it by name next pass
                warn!(
                    "Record id {} for {} not found, will rediscover by name",
                    entry.record_id,
                    entry.domain()
                );
                entry.forget_record_id();
            }
            return Err(e);
        }

        if entry.address == desired {
            return Ok(Outcome::AlreadyCorrect { address: desired });
        }

        let previous = entry.address.clone();
        let accepted = self.provider.set_address(&desired, entry).await?;

        if accepted {
            Ok(Outcome::Updated {
                previous,
                address: desired,
            })
        } else {
            Ok(Outcome::UpdateRejected {
                current: previous,
                desired,
            })
        }
    }

    /// Work out the address a record should point at
    ///
    /// The public address is fetched on first need; later records in the
    /// same pass reuse the answer, including a failed one.
    async fn desired_address(
        &self,
        record: &RecordConfig,
        public_address: &mut PublicLookup,
    ) -> Result<String> {
        if !record.tracks_public_address() {
            return Ok(record.address.clone());
        }

        match public_address {
            Some(Ok(address)) => return Ok(address.clone()),
            Some(Err(message)) => return Err(Error::ip_source(message.clone())),
            None => {}
        }

        match self.ip_source.current().await {
            Ok(ip) => {
                let address = ip.to_string();
                debug!(
                    "Public address from {}: {}",
                    self.ip_source.source_name(),
                    address
                );
                *public_address = Some(Ok(address.clone()));
                Ok(address)
            }
            Err(e) => {
                let message = match &e {
                    Error::IpSource(message) => message.clone(),
                    other => other.to_string(),
                };
                *public_address = Some(Err(message));
                Err(e)
            }
        }
    }

    /// Log an outcome and emit the matching event
    fn report_outcome(&self, domain: &str, outcome: &Outcome) {
        let event = match outcome {
            Outcome::AlreadyCorrect { address } => {
                info!("Record {} still points at address {}", domain, address);
                ReconcileEvent::AlreadyCorrect {
                    domain: domain.to_string(),
                    address: address.clone(),
                }
            }
            Outcome::Updated { previous, address } => {
                info!(
                    "Updated record {} to point to address {} (was {})",
                    domain, address, previous
                );
                ReconcileEvent::Updated {
                    domain: domain.to_string(),
                    previous: previous.clone(),
                    address: address.clone(),
                }
            }
            Outcome::UpdateRejected { current, desired } => {
                warn!(
                    "{} refused to change record {} from {} to {}",
                    self.provider.provider_name(),
                    domain,
                    current,
                    desired
                );
                ReconcileEvent::UpdateRejected {
                    domain: domain.to_string(),
                    current: current.clone(),
                    desired: desired.clone(),
                }
            }
            Outcome::Skipped { error } => ReconcileEvent::DomainSkipped {
                domain: domain.to_string(),
                error: error.clone(),
            },
        };
        self.emit_event(event);
    }

    /// Emit an engine event
    fn emit_event(&self, event: ReconcileEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            // A closed channel just means nobody is listening
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
