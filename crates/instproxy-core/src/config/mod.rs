//! Client configuration
//!
//! Holds the remote staging path used for transferred archives and the
//! default/extended receive timeouts handed to channel implementations.

pub mod parser;
pub mod store;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use parser::{parse_config, parse_config_str, to_toml};
pub use store::ConfigStore;

/// Remote path archives are staged at before Install/Upgrade.
///
/// Every operation and every client talking to the same device shares it.
pub const DEFAULT_STAGING_PATH: &str = "/PublicStaging/instproxy.ipa";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const EXTENDED_TIMEOUT_SECS: u64 = 300;

/// Top-level configuration file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub staging_path: String,
    pub timeouts: TimeoutConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            staging_path: DEFAULT_STAGING_PATH.to_string(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl ProxyConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.staging_path.is_empty() {
            anyhow::bail!("staging_path must not be empty");
        }
        if !self.staging_path.starts_with('/') {
            anyhow::bail!(
                "staging_path must be an absolute device path, got '{}'",
                self.staging_path
            );
        }
        self.timeouts.validate()
    }
}

/// Receive deadlines, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub default_secs: u64,
    /// Used while waiting for install/upgrade completion.
    pub extended_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: DEFAULT_TIMEOUT_SECS,
            extended_secs: EXTENDED_TIMEOUT_SECS,
        }
    }
}

impl TimeoutConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }

    pub fn extended_timeout(&self) -> Duration {
        Duration::from_secs(self.extended_secs)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_secs == 0 {
            anyhow::bail!("timeouts.default_secs must be greater than zero");
        }
        if self.extended_secs < self.default_secs {
            anyhow::bail!(
                "timeouts.extended_secs ({}) must not be shorter than timeouts.default_secs ({})",
                self.extended_secs,
                self.default_secs
            );
        }
        Ok(())
    }
}
