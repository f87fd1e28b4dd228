//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::rounding::{RoundingMethod, RoundingPolicy};
use crate::storage::database::default_database_path;

/// Chronobill configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseSection,
    pub policy: PolicySection,
}

/// Database location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

/// Default rounding policy applied to newly created projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySection {
    pub granularity: f64,
    pub method: RoundingMethod,
    pub invoicing_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        let policy = RoundingPolicy::default();
        Self {
            database: DatabaseSection {
                path: default_database_path(),
            },
            policy: PolicySection {
                granularity: policy.granularity,
                method: policy.method,
                invoicing_factor: policy.invoicing_factor,
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("CHRONOBILL_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("chronobill")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let path = Self::config_path()?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Resolved database path, honoring the `CHRONOBILL_DB` override
    pub fn database_path(&self) -> PathBuf {
        if let Ok(path) = env::var("CHRONOBILL_DB") {
            PathBuf::from(path)
        } else {
            self.database.path.clone()
        }
    }

    /// Default rounding policy for new projects
    pub fn default_policy(&self) -> RoundingPolicy {
        RoundingPolicy {
            granularity: self.policy.granularity,
            method: self.policy.method,
            invoicing_factor: self.policy.invoicing_factor,
        }
    }
}
