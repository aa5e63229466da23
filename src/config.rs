//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

const ENV_LOG: &str = "ACCESS_WIZARD_LOG";
const ENV_COMPLETION_TIMEOUT: &str = "ACCESS_WIZARD_COMPLETION_TIMEOUT_SECS";
const ENV_TITLE: &str = "ACCESS_WIZARD_TITLE";

/// Wizard engine configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Fallback `tracing` filter when `RUST_LOG` is not set.
    pub log_filter: String,
    /// A completion hand-off still pending after this long is abandoned.
    pub completion_timeout: Duration,
    /// Title used when a definition does not carry one.
    pub default_title: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            completion_timeout: Duration::from_secs(30),
            default_title: "Wizard".to_string(),
        }
    }
}

impl WizardConfig {
    /// Build a config from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }

        if let Some(raw) = lookup(ENV_COMPLETION_TIMEOUT) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_COMPLETION_TIMEOUT.to_string(),
                message: format!("expected whole seconds, got {raw:?}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: ENV_COMPLETION_TIMEOUT.to_string(),
                    message: "timeout must be greater than zero".to_string(),
                });
            }
            config.completion_timeout = Duration::from_secs(secs);
        }

        if let Some(title) = lookup(ENV_TITLE).filter(|v| !v.trim().is_empty()) {
            config.default_title = title;
        }

        Ok(config)
    }
}
