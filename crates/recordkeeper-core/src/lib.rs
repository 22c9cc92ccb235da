// # recordkeeper-core
//
// Core library for keeping DNS records pointed at a target address.
//
// ## Architecture Overview
//
// - **Entry**: In-memory view of one managed record, plus the merge policy
//   applied when provider data arrives
// - **EntryCache**: Process-lifetime store of resolved entries
// - **DnsProvider**: Trait for resolving and updating records via a provider API
// - **IpSource**: Trait for looking up the host's public address
// - **ReconcileEngine**: Runs passes that resolve, compare and update every record
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Sequential**: One record at a time, one pass at a time, no locking
// 2. **Explicit ownership**: Credentials live in the provider, the cache in
//    the engine; nothing is process-global
// 3. **Recover per record**: A failing record is skipped for the pass, never
//    fatal to the loop
// 4. **Library-First**: The daemon is a thin wrapper over this crate

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod entry;
pub mod cache;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{ReconcileEngine, ReconcileEvent, Outcome, PassReport};
pub use registry::ProviderRegistry;
pub use config::{RecordkeeperConfig, ProviderConfig, RecordConfig, Schedule};
pub use error::{Error, Result};
pub use entry::{Entry, RecordAttributes, PUBLIC_ADDRESS};
pub use cache::EntryCache;
