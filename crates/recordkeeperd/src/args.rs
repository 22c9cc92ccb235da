//! Command-line argument parsing
//!
//! Flags take precedence over environment variables, which take precedence
//! over the config file.

use clap::Parser;
use recordkeeper_core::config::CONFIG_PATH_ENV;
use recordkeeper_core::{RecordkeeperConfig, Result};
use std::path::PathBuf;

/// Keep DNS records pointed at their target addresses
#[derive(Debug, Default, Parser)]
#[command(author, version)]
pub struct Args {
    /// Configuration file to use instead of the default search path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// DNS provider to use
    #[arg(long, value_name = "NAME")]
    pub provider: Option<String>,

    /// Username for the DNS provider (`service-key` selects a service key)
    #[arg(long, value_name = "USERNAME")]
    pub username: Option<String>,

    /// Authentication token for the DNS provider
    #[arg(long = "authToken", visible_alias = "auth-token", value_name = "TOKEN")]
    pub auth_token: Option<String>,

    /// Minutes between passes; 0 or less runs a single pass
    #[arg(long, allow_negative_numbers = true, value_name = "MINUTES")]
    pub interval: Option<i64>,
}

impl Args {
    /// Load configuration from file and `env`, apply these flags, validate
    pub fn load_config(&self, env: impl Fn(&str) -> Option<String>) -> Result<RecordkeeperConfig> {
        let config_path = self
            .config
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned());

        let mut config = RecordkeeperConfig::from_sources(|key| {
            if key == CONFIG_PATH_ENV && config_path.is_some() {
                return config_path.clone();
            }
            env(key)
        })?;

        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`
    pub fn apply_to(&self, config: &mut RecordkeeperConfig) {
        if let Some(provider) = &self.provider {
            config.provider.name = provider.clone();
        }
        if let Some(username) = &self.username {
            config.provider.username = username.clone();
        }
        if let Some(token) = &self.auth_token {
            config.provider.auth_token = token.clone();
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
    }
}
