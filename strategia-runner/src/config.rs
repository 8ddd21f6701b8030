//! Engine configuration (`strategia.toml`).
//!
//! ```toml
//! [protection]
//! market_floor = 40.0
//! risk_floor = 50.0
//!
//! [audit]
//! path = "data/decisoes.jsonl"
//! timeout_ms = 2000
//! max_retries = 2
//!
//! [rules]
//! path = "config/regras.toml"   # omit to use the built-in tables
//! ```
//!
//! Every key has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use strategia_core::{ProtectionConfig, RuleSet, RuleSetError};

use crate::audit::PersistencePolicy;

/// Errors from loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub protection: ProtectionConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Cap on writer threads still blocked in the store after a timeout.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("data/decisoes.jsonl")
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_in_flight() -> usize {
    4
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: default_audit_path(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    /// TOML rule set; the built-in tables are used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.protection;
        for (name, v) in [("market_floor", p.market_floor), ("risk_floor", p.risk_floor)] {
            if !v.is_finite() {
                return Err(ConfigError::Invalid(format!("protection.{name} must be finite")));
            }
        }
        for (name, v) in [
            ("market_reduce_percent", p.market_reduce_percent),
            ("risk_reduce_percent", p.risk_reduce_percent),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(ConfigError::Invalid(format!(
                    "protection.{name} = {v} is outside [0, 100]"
                )));
            }
        }
        if self.audit.timeout_ms == 0 {
            return Err(ConfigError::Invalid("audit.timeout_ms must be > 0".into()));
        }
        if self.audit.max_in_flight == 0 {
            return Err(ConfigError::Invalid("audit.max_in_flight must be > 0".into()));
        }
        Ok(())
    }

    pub fn persistence_policy(&self) -> PersistencePolicy {
        PersistencePolicy::new(
            Duration::from_millis(self.audit.timeout_ms),
            self.audit.max_retries,
            self.audit.max_in_flight,
        )
    }

    /// The configured rule set, or the built-in one.
    pub fn load_rules(&self) -> Result<RuleSet, RuleSetError> {
        match &self.rules.path {
            Some(path) => RuleSet::from_file(path),
            None => Ok(RuleSet::builtin()),
        }
    }
}
