// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Configuration management for BDA

use crate::binding::{DatabaseBinding, DatabaseBindings};
use crate::error::{BdaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Blob store settings
    pub store: StoreConfig,

    /// Completion polling settings
    pub poll: PollConfig,

    /// How unparsable cell values are handled
    pub coercion: CoercionMode,

    /// Logical database bindings
    pub databases: Vec<DatabaseBinding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            store: StoreConfig::default(),
            poll: PollConfig::default(),
            coercion: CoercionMode::default(),
            databases: Vec::new(),
        }
    }
}

/// Which object store implementation backs the blob store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Buckets are directories under `root`
    #[default]
    Local,
    /// Process-local store, contents vanish on exit
    Memory,
    /// Amazon S3 (credentials are read from the environment)
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Root directory for the local backend
    pub root: PathBuf,

    /// S3 region
    pub region: Option<String>,

    /// Custom S3 endpoint (MinIO and friends)
    pub endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            root: PathBuf::from("./bda-data"),
            region: None,
            endpoint: None,
        }
    }
}

/// Bounded exponential backoff between status polls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay before the second poll (ms)
    pub initial_interval_ms: u64,

    /// Upper bound of the delay between polls (ms)
    pub max_interval_ms: u64,

    /// Growth factor applied after each non-terminal poll
    pub multiplier: f64,

    /// Overall time allowed for a query to reach a terminal state (seconds)
    pub timeout_s: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 200,
            max_interval_ms: 5_000,
            multiplier: 2.0,
            timeout_s: 300,
        }
    }
}

impl PollConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }

    /// Reject policies that would poll without backing off or never time out
    pub fn validate(&self) -> Result<()> {
        if self.initial_interval_ms == 0 {
            return Err(BdaError::Configuration(
                "poll.initial_interval_ms cannot be 0".to_string(),
            ));
        }
        if self.max_interval_ms < self.initial_interval_ms {
            return Err(BdaError::Configuration(
                "poll.max_interval_ms must be >= poll.initial_interval_ms".to_string(),
            ));
        }
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(BdaError::Configuration(
                "poll.multiplier must be >= 1.0".to_string(),
            ));
        }
        if self.timeout_s == 0 {
            return Err(BdaError::Configuration(
                "poll.timeout_s cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay to wait after `current`, capped at `max_interval`
    pub fn next_interval(&self, current: Duration) -> Duration {
        let max = self.max_interval();
        let next_ms = current.as_millis() as f64 * self.multiplier;
        if next_ms.is_finite() && next_ms < max.as_millis() as f64 {
            Duration::from_millis(next_ms as u64)
        } else {
            max
        }
    }
}

/// Policy for cell values that fail to parse as their declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionMode {
    /// Substitute the zero value of the declared type
    #[default]
    Lenient,
    /// Fail the query with a conversion error
    Strict,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BdaError::Configuration(e.to_string()))
    }

    /// Override file settings with `BDA_*` environment variables when present
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("BDA_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Ok(timeout) = std::env::var("BDA_POLL_TIMEOUT_S") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.poll.timeout_s = secs,
                Err(_) => log::warn!("Ignoring invalid BDA_POLL_TIMEOUT_S: {}", timeout),
            }
        }

        if let Ok(root) = std::env::var("BDA_STORE_ROOT") {
            self.store.root = PathBuf::from(root);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.poll.validate()?;
        for binding in &self.databases {
            if binding.database.is_empty() || binding.output_location.is_empty() {
                return Err(BdaError::Configuration(format!(
                    "database binding {} needs both database and output_location",
                    binding.name
                )));
            }
        }
        // Surfaces duplicate names
        self.bindings().map(|_| ())
    }

    pub fn bindings(&self) -> Result<DatabaseBindings> {
        DatabaseBindings::new(self.databases.iter().cloned())
    }
}
