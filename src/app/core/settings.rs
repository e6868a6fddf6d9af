// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::EnvFilter;

use super::config::{Config, ConfigError};

const DEFAULT_LOG_FILTER: &str = "databank=info";

/// Install the logger and load the configuration, what a front-end needs before opening a store
pub fn init() -> Result<Config, ConfigError> {
    init_logger();
    let config = Config::load()?;
    tracing::debug!(storage = ?config.storage, "configuration loaded");
    Ok(config)
}

/// Log to stderr, filtered by `RUST_LOG` when set. Calling it twice is harmless.
pub fn init_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
