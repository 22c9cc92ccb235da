// # DNS Provider Trait
//
// Defines the uniform contract the reconciliation engine drives a DNS
// provider through.
//
// ## Implementations
//
// - Cloudflare: `recordkeeper-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use recordkeeper_core::{DnsProvider, Entry};
//
// let mut entry = Entry::new("home.example.com", "public");
// provider.resolve(&mut entry).await?;
//
// if entry.address != "203.0.113.5" {
//     let accepted = provider.set_address("203.0.113.5", &mut entry).await?;
// }
// ```

use async_trait::async_trait;

use crate::entry::Entry;

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - [`resolve`](DnsProvider::resolve) hydrates every derivable field of the
///   entry. Identifiers already present on the entry are trusted and never
///   re-derived; the proxy flag and current address are refreshed on every
///   call.
/// - [`set_address`](DnsProvider::set_address) issues exactly one update and
///   reports the provider's success flag. A well-formed refusal is
///   `Ok(false)`, never an error.
///
/// Providers never retry and never sleep; the engine owns scheduling.
/// Both methods fail with:
///
/// - `Error::Lookup` when the zone or record cannot be found
/// - `Error::Transport` when a request cannot be built or sent
/// - `Error::Decode` when a response is not the expected envelope
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Hydrate all derivable fields of `entry` from the provider
    async fn resolve(&self, entry: &mut Entry) -> Result<(), crate::Error>;

    /// Point the record at `address`
    ///
    /// Sets `entry.address` to `address` before sending the update, so the
    /// entry reflects the attempted value.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The provider accepted the update
    /// - `Ok(false)`: The provider answered but reported failure
    /// - `Err(Error)`: The update could not be sent or the answer decoded
    async fn set_address(&self, address: &str, entry: &mut Entry) -> Result<bool, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider name and credentials
    /// - `timeout`: Request timeout applied to every API call
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
        timeout: std::time::Duration,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
