//! Error types for recordkeeper
//!
//! The reconciliation loop distinguishes three provider failure classes
//! (lookup, transport, decode) from a provider that answered but refused.
//! All of them are recovered per domain; none of them stop the loop.

use thiserror::Error;

/// Result type alias for recordkeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recordkeeper
#[derive(Error, Debug)]
pub enum Error {
    /// Zone or record not found after exhausting every listing page
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Request could not be constructed or sent
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Response body is not the expected envelope shape
    #[error("Decode failure: {0}")]
    Decode(String),

    /// Provider answered a listing call with `success: false`
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Public address lookup errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a lookup failure
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a transport failure
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode failure
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is a lookup failure (zone or record absent)
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_classification() {
        assert!(Error::lookup("zone example.com").is_lookup());
        assert!(!Error::transport("connection refused").is_lookup());
        assert!(!Error::decode("expected envelope").is_lookup());
    }

    #[test]
    fn test_display_carries_provider() {
        let err = Error::provider("cloudflare", "Authentication error");
        assert_eq!(
            err.to_string(),
            "Provider error (cloudflare): Authentication error"
        );
    }
}
