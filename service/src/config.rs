//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rewards_claims::RewardPolicy;
use rewards_types::RoundId;
use rewards_utils::LogFormat;

use crate::ServiceError;

/// Configuration for the rewards service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Data directory for claim storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The round claims are currently issued for. Rolling over to a new
    /// round is a config change.
    #[serde(default = "default_round_id")]
    pub round_id: String,

    /// Maximum LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run the storage integrity check when the service opens.
    #[serde(default = "default_true")]
    pub check_integrity: bool,

    /// Reward bands and token conversion.
    #[serde(default)]
    pub policy: RewardPolicy,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./rewards_data")
}

fn default_round_id() -> String {
    "round-1".to_string()
}

fn default_map_size_mb() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// The configured round as a validated identifier.
    ///
    /// A bad round id is an operator mistake, so it is reported as a config
    /// error rather than as invalid caller input.
    pub fn round(&self) -> Result<RoundId, ServiceError> {
        RoundId::new(self.round_id.as_str())
            .map_err(|e| ServiceError::Config(format!("round_id: {e}")))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Check everything that can be checked without touching storage.
    pub fn validate(&self) -> Result<(), ServiceError> {
        self.round()?;
        self.policy.validate()?;
        if self.map_size_mb == 0 {
            return Err(ServiceError::Config("map_size_mb must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            round_id: default_round_id(),
            map_size_mb: default_map_size_mb(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            check_integrity: default_true(),
            policy: RewardPolicy::default(),
        }
    }
}
