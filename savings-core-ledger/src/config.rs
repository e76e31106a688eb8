//! Ledger tuning knobs.
//!
//! Defaults are usable as-is; `LEDGER_*` environment variables override them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Engine and projector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Retries after the first CAS attempt before giving up with `Contended`.
    pub max_cas_retries: u32,
    /// Backoff before the first retry, doubled on every further retry.
    pub base_backoff_ms: u64,
    /// Upper bound for a single backoff, jitter excluded.
    pub max_backoff_ms: u64,
    pub default_page_limit: usize,
    pub max_page_limit: usize,
    /// Deadline applied to every mutating operation when set.
    pub operation_timeout_ms: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_cas_retries: 5,
            base_backoff_ms: 5,
            max_backoff_ms: 200,
            default_page_limit: 20,
            max_page_limit: 100,
            operation_timeout_ms: None,
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `LEDGER_*` environment variables.
    ///
    /// Recognised: `LEDGER_MAX_CAS_RETRIES`, `LEDGER_BASE_BACKOFF_MS`,
    /// `LEDGER_MAX_BACKOFF_MS`, `LEDGER_DEFAULT_PAGE_LIMIT`,
    /// `LEDGER_MAX_PAGE_LIMIT`, `LEDGER_OPERATION_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_value("LEDGER_MAX_CAS_RETRIES")? {
            self.max_cas_retries = value;
        }
        if let Some(value) = env_value("LEDGER_BASE_BACKOFF_MS")? {
            self.base_backoff_ms = value;
        }
        if let Some(value) = env_value("LEDGER_MAX_BACKOFF_MS")? {
            self.max_backoff_ms = value;
        }
        if let Some(value) = env_value("LEDGER_DEFAULT_PAGE_LIMIT")? {
            self.default_page_limit = value;
        }
        if let Some(value) = env_value("LEDGER_MAX_PAGE_LIMIT")? {
            self.max_page_limit = value;
        }
        if let Some(value) = env_value("LEDGER_OPERATION_TIMEOUT_MS")? {
            self.operation_timeout_ms = Some(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_limit == 0 {
            return Err(ConfigError::Invalid("max_page_limit must be at least 1".to_string()));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(ConfigError::Invalid(format!(
                "default_page_limit must be within 1..={}",
                self.max_page_limit
            )));
        }
        if self.base_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "base_backoff_ms must not exceed max_backoff_ms".to_string(),
            ));
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("operation_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

fn env_value<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}")]
    InvalidValue { var: String, value: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
