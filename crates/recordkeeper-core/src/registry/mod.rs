//! Plugin-based provider registry
//!
//! The registry maps provider names from configuration to factories, so
//! the daemon never hardcodes an if-else chain over provider crates.
//!
//! ## Registration
//!
//! Provider crates expose a `register()` hook:
//!
//! ```rust,ignore
//! // In recordkeeper-provider-cloudflare
//! pub fn register(registry: &mut ProviderRegistry) {
//!     registry.register_provider("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::time::Duration;

/// Provider registry for plugin-based DNS provider creation
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: HashMap<String, Box<dyn DnsProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn DnsProviderFactory>,
    ) {
        self.providers.insert(name.into(), factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider name is not registered or creation fails
    pub fn create_provider(
        &self,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn DnsProvider>> {
        let factory = self.providers.get(&config.name).ok_or_else(|| {
            let mut known = self.list_providers();
            known.sort();
            Error::config(format!(
                "Unknown provider: {}. Registered providers: {}",
                config.name,
                known.join(", ")
            ))
        })?;

        factory.create(config, timeout)
    }

    /// List all registered provider names
    pub fn list_providers(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Check if a provider name is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    impl DnsProviderFactory for MockProviderFactory {
        fn create(
            &self,
            _config: &ProviderConfig,
            _timeout: Duration,
        ) -> Result<Box<dyn DnsProvider>> {
            Err(Error::config("Mock provider not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let mut registry = ProviderRegistry::new();

        // Initially empty
        assert!(!registry.has_provider("mock"));

        // Register
        registry.register_provider("mock", Box::new(MockProviderFactory));

        // Now present
        assert!(registry.has_provider("mock"));
        assert!(registry.list_providers().contains(&"mock".to_string()));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let registry = ProviderRegistry::new();
        let config = ProviderConfig::new("route53", "user", "key");

        let result = registry.create_provider(&config, Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
