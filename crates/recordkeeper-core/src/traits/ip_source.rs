// # IP Source Trait
//
// Defines the interface for looking up the host's current public address.
//
// ## Implementations
//
// - HTTP lookup service: `recordkeeper-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use recordkeeper_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let current_ip = source.current().await?;
//     println!("public address: {}", current_ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public address lookups
///
/// The engine calls [`IpSource::current`] at most once per pass, and only
/// when a configured record tracks the public address.
///
/// Implementations must not cache across calls: every call reflects the
/// address at the time of the call.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current address
    /// - `Err(Error)`: If the address could not be determined
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
