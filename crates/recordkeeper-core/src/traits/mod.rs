//! Core traits for recordkeeper
//!
//! This module defines the abstract interfaces the reconciliation engine
//! consumes.
//!
//! - [`IpSource`]: Look up the host's current public address
//! - [`DnsProvider`]: Resolve and update records via a provider API

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsProviderFactory};
