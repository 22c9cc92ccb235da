//! Cloudflare credential selection
//!
//! One configured (username, token) pair maps to one of two header sets.
//! The username [`SERVICE_KEY_USERNAME`] selects a service key; anything
//! else is taken as the account email for a global API key.

use reqwest::RequestBuilder;

/// Username that selects `X-Auth-User-Service-Key` authentication
pub const SERVICE_KEY_USERNAME: &str = "service-key";

/// Credentials for the Cloudflare API
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the key.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Account email plus global API key
    ApiKey { email: String, key: String },
    /// Origin CA service key
    ServiceKey { key: String },
}

impl Credentials {
    /// Select credentials from a configured username/token pair
    pub fn from_pair(username: &str, token: impl Into<String>) -> Self {
        if username == SERVICE_KEY_USERNAME {
            Credentials::ServiceKey { key: token.into() }
        } else {
            Credentials::ApiKey {
                email: username.to_string(),
                key: token.into(),
            }
        }
    }

    /// Attach the authentication headers to a request
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::ApiKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
            Credentials::ServiceKey { key } => request.header("X-Auth-User-Service-Key", key),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
            Credentials::ServiceKey { .. } => f
                .debug_struct("ServiceKey")
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}
