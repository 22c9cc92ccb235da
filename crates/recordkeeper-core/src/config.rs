//! Configuration types for recordkeeper
//!
//! Configuration comes from an optional JSON file overlaid with
//! `RECORDKEEPER_*` environment variables, then validated. See
//! [`RecordkeeperConfig::load`].

use crate::entry::PUBLIC_ADDRESS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "RECORDKEEPER_CONFIG";

/// Config file locations searched when [`CONFIG_PATH_ENV`] is unset,
/// relative ones resolved against `$HOME` or the working directory
const SYSTEM_CONFIG_PATH: &str = "/etc/recordkeeper/config.json";
const USER_CONFIG_PATH: &str = ".config/recordkeeper/config.json";
const LOCAL_CONFIG_PATH: &str = "config.json";

/// Main recordkeeper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordkeeperConfig {
    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Minutes between reconciliation passes; `<= 0` runs a single pass
    #[serde(default = "default_interval")]
    pub interval: i64,

    /// DNS records to keep
    #[serde(default)]
    pub records: Vec<RecordConfig>,

    /// Public address lookup settings
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,

    /// Timeout applied to every outbound HTTP request (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Capacity of the engine's event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl RecordkeeperConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            interval: default_interval(),
            records: Vec::new(),
            ip_lookup: IpLookupConfig::default(),
            http_timeout_secs: default_http_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Load configuration from the process environment
    ///
    /// Reads the config file (if any), applies environment overrides and
    /// validates the result.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the process environment
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self::from_sources(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the config file (if any) and apply environment overrides
    /// without validating, so callers can layer further overrides on top
    pub fn from_sources(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match locate_config_file(&lookup) {
            Some(path) => {
                tracing::debug!("Reading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::debug!("No configuration file found, using environment only");
                Self::new()
            }
        };

        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    /// Parse a JSON configuration file
    ///
    /// Besides the nested `provider` object, the flat layout is accepted:
    /// a top-level `"provider": "<name>"` string with top-level `username`
    /// and `authToken` keys.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        let malformed =
            |e: serde_json::Error| Error::config(format!("Malformed config file {}: {}", path.display(), e));

        let mut document: serde_json::Value = serde_json::from_str(&contents).map_err(malformed)?;
        lift_flat_provider_keys(&mut document);
        serde_json::from_value(document).map_err(malformed)
    }

    /// Overlay `RECORDKEEPER_*` variables onto this configuration
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(name) = lookup("RECORDKEEPER_PROVIDER") {
            self.provider.name = name;
        }
        if let Some(username) = lookup("RECORDKEEPER_USERNAME") {
            self.provider.username = username;
        }
        if let Some(token) = lookup("RECORDKEEPER_AUTH_TOKEN") {
            self.provider.auth_token = token;
        }
        if let Some(interval) = lookup("RECORDKEEPER_INTERVAL") {
            self.interval = interval.trim().parse().map_err(|_| {
                Error::config(format!(
                    "RECORDKEEPER_INTERVAL must be a whole number of minutes. Got: {}",
                    interval
                ))
            })?;
        }
        if let Some(records) = lookup("RECORDKEEPER_RECORDS") {
            self.records = parse_records(&records);
        }
        if let Some(url) = lookup("RECORDKEEPER_IP_URL") {
            self.ip_lookup.url = url;
        }
        if let Some(timeout) = lookup("RECORDKEEPER_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::config(format!(
                    "RECORDKEEPER_HTTP_TIMEOUT_SECS must be a positive integer. Got: {}",
                    timeout
                ))
            })?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;

        if self.records.is_empty() {
            return Err(Error::config(
                "No records configured. Set RECORDKEEPER_RECORDS or add \"records\" to the config file",
            ));
        }

        let mut seen = HashSet::new();
        for record in &self.records {
            record.validate()?;
            if !seen.insert(record.name.as_str()) {
                return Err(Error::config(format!(
                    "Record {} is configured more than once",
                    record.name
                )));
            }
        }

        self.ip_lookup.validate()?;

        if self.http_timeout_secs == 0 {
            return Err(Error::config("HTTP timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }

    /// The pass schedule derived from `interval`
    pub fn schedule(&self) -> Schedule {
        Schedule::from_interval_minutes(self.interval)
    }

    /// The outbound HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for RecordkeeperConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// When reconciliation passes run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run exactly one pass, then stop
    Once,
    /// Run a pass, sleep for the duration, repeat
    Every(Duration),
}

impl Schedule {
    /// Build a schedule from a minute interval; `<= 0` means [`Schedule::Once`]
    ///
    /// Intervals too large to express in seconds saturate to the longest
    /// representable sleep.
    pub fn from_interval_minutes(minutes: i64) -> Self {
        if minutes <= 0 {
            Schedule::Once
        } else {
            Schedule::Every(Duration::from_secs(
                minutes.unsigned_abs().saturating_mul(60),
            ))
        }
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registered provider name
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Account username (or the provider's service-key sentinel)
    #[serde(default)]
    pub username: String,

    /// API key or service key
    /// ⚠️ NEVER log this value
    #[serde(default, alias = "authToken")]
    pub auth_token: String,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

impl ProviderConfig {
    /// Create a provider configuration
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("Provider name cannot be empty"));
        }
        if self.username.is_empty() {
            return Err(Error::config(
                "Provider username is required. Set RECORDKEEPER_USERNAME",
            ));
        }
        if self.auth_token.is_empty() {
            return Err(Error::config(
                "Provider auth token is required. Set RECORDKEEPER_AUTH_TOKEN",
            ));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(default_provider_name(), "", "")
    }
}

/// DNS record configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// DNS record name (e.g., "home.example.com")
    pub name: String,

    /// Target address, or `"public"` to track the host's public IP
    #[serde(default = "default_address")]
    pub address: String,

    /// Known zone identifier (skips zone discovery)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    /// Known record identifier (skips discovery by name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Known record type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    /// Known TTL in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl RecordConfig {
    /// Create a record that tracks the public address
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: default_address(),
            zone_id: None,
            record_id: None,
            record_type: None,
            ttl: None,
        }
    }

    /// Set a fixed target address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Seed a known zone identifier
    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    /// Seed a known record identifier
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Whether this record follows the host's public address
    pub fn tracks_public_address(&self) -> bool {
        self.address == PUBLIC_ADDRESS
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<()> {
        validate_domain_name(&self.name)?;
        if self.address.is_empty() {
            return Err(Error::config(format!(
                "Record {} has an empty address (use \"{}\" to track the public IP)",
                self.name, PUBLIC_ADDRESS
            )));
        }
        Ok(())
    }
}

/// Public address lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// Service returning the caller's address as a bare string
    #[serde(default = "default_ip_lookup_url")]
    pub url: String,
}

impl IpLookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(Error::config(format!(
                "IP lookup URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            url: default_ip_lookup_url(),
        }
    }
}

/// Parse `name=address` pairs separated by commas; a bare name tracks
/// the public address
pub fn parse_records(list: &str) -> Vec<RecordConfig> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((name, address)) => {
                RecordConfig::new(name.trim()).with_address(address.trim())
            }
            None => RecordConfig::new(item),
        })
        .collect()
}

/// Basic domain name validation
///
/// Not exhaustive; catches empty names, empty or oversized labels and
/// characters that can never appear in a host name.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Record name cannot be empty"));
    }
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Record name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Record name has empty label: '{}'",
                domain
            )));
        }
        if label.len() > 63 {
            return Err(Error::config(format!(
                "Record label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*')
        {
            return Err(Error::config(format!(
                "Record label contains invalid characters. Label: '{}'",
                label
            )));
        }
    }
    Ok(())
}

/// Move flat provider keys into the nested `provider` object
///
/// Keys already present in the nested object win.
fn lift_flat_provider_keys(document: &mut serde_json::Value) {
    let Some(root) = document.as_object_mut() else {
        return;
    };

    let mut provider = match root.remove("provider") {
        Some(serde_json::Value::String(name)) => {
            let mut nested = serde_json::Map::new();
            nested.insert("name".to_string(), serde_json::Value::String(name));
            nested
        }
        Some(serde_json::Value::Object(nested)) => nested,
        Some(other) => {
            // Leave it for serde to reject with a proper message
            root.insert("provider".to_string(), other);
            return;
        }
        None => serde_json::Map::new(),
    };

    for (flat, nested) in [
        ("username", "username"),
        ("authToken", "auth_token"),
        ("auth_token", "auth_token"),
    ] {
        if let Some(value) = root.remove(flat) {
            let already_set = provider.contains_key(nested)
                || (nested == "auth_token" && provider.contains_key("authToken"));
            if !already_set {
                provider.insert(nested.to_string(), value);
            }
        }
    }

    if !provider.is_empty() {
        root.insert("provider".to_string(), serde_json::Value::Object(provider));
    }
}

fn locate_config_file(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(path) = lookup(CONFIG_PATH_ENV) {
        // An explicit path is used even if missing so the read error surfaces
        return Some(PathBuf::from(path));
    }

    let mut candidates = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(home) = lookup("HOME") {
        candidates.push(Path::new(&home).join(USER_CONFIG_PATH));
    }
    candidates.push(PathBuf::from(LOCAL_CONFIG_PATH));

    candidates.into_iter().find(|path| path.is_file())
}

fn default_provider_name() -> String {
    "cloudflare".to_string()
}

fn default_address() -> String {
    PUBLIC_ADDRESS.to_string()
}

fn default_interval() -> i64 {
    60
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_ip_lookup_url() -> String {
    "https://api.ipify.org".to_string()
}
