// SPDX-License-Identifier: GPL-3.0

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::core::{models::Direction, utils};

const CONFIG_VERSION: u64 = 1;
const CONFIG_FILE: &str = "config.ron";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Startup configuration problems, the application cannot run until they are fixed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the cloud backend is selected but no document store url is configured")]
    MissingDocumentStore,
    #[error("failed to read the configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration file: {0}")]
    Parse(String),
    #[error("failed to write the configuration file: {0}")]
    Serialize(String),
    #[error("unsupported configuration version {0}")]
    Version(u64),
    #[error("{0}")]
    Location(String),
}

/// Where decks are persisted
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    #[default]
    Device,
    Cloud,
}

/// Configuration data that persists between application runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u64,
    pub storage: StorageBackend,
    /// Url of the document database used by [`StorageBackend::Cloud`]
    pub document_store_url: Option<String>,
    /// Key of the generative text service, without it enrichment is disabled
    pub api_key: Option<String>,
    pub enrichment_timeout_secs: u64,
    pub default_chunk_size: usize,
    pub default_direction: Direction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: StorageBackend::default(),
            document_store_url: None,
            api_key: None,
            enrichment_timeout_secs: 15,
            default_chunk_size: 20,
            default_direction: Direction::default(),
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn path() -> Result<PathBuf, ConfigError> {
        utils::config_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .map_err(|e| ConfigError::Location(e.to_string()))
    }

    /// Load the configuration from the default location, a missing file gives the defaults
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load the configuration from `path`, a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            ron::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::Version(config.version));
        }
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks the settings needed before any deck can be loaded
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage == StorageBackend::Cloud && self.document_store_url().is_none() {
            return Err(ConfigError::MissingDocumentStore);
        }
        Ok(())
    }

    pub fn document_store_url(&self) -> Option<&str> {
        self.document_store_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Store a new api key, a blank key clears the stored one
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
    }

    /// The stored api key, or the one in the environment when none is stored
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| {
                std::env::var(API_KEY_ENV)
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty() && key != "undefined")
            })
    }

    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment_timeout_secs.max(1))
    }

    pub fn chunk_size(&self) -> usize {
        self.default_chunk_size.max(1)
    }
}
