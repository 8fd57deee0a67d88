//! CLI Argument Converter
//!
//! Layers command-line overrides on top of configuration file settings.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cli::Args;
use crate::collector::CollectorConfig;
use crate::config::ConfigManager;

/// CLI conversion errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Invalid collector settings: {message}")]
    Collector { message: String },

    #[error("Invalid concurrency: {value} must be greater than 0")]
    InvalidConcurrency { value: usize },
}

impl CliError {
    fn configuration(error: anyhow::Error) -> Self {
        Self::Configuration { message: format!("{:#}", error) }
    }
}

/// Collector settings: config file first, then CLI overrides
pub fn args_to_collector_config(args: &Args, config_manager: Option<&ConfigManager>) -> Result<CollectorConfig, CliError> {
    let mut config = match config_manager {
        Some(manager) => manager.get_collector_config().map_err(CliError::configuration)?,
        None => CollectorConfig::default(),
    };

    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(ms) = args.page_delay_ms {
        config.page_delay = Duration::from_millis(ms);
    }
    if let Some(secs) = args.deadline_secs {
        config.deadline = (secs > 0).then(|| Duration::from_secs(secs));
    }

    config.validate().map_err(|message| CliError::Collector { message })?;
    Ok(config)
}

/// Snapshot store location: `--store`, then `[store] path`, then the data directory
pub fn args_to_store_path(args: &Args, config_manager: &ConfigManager) -> Result<PathBuf, CliError> {
    match &args.store {
        Some(path) => Ok(path.clone()),
        None => config_manager.get_store_path().map_err(CliError::configuration),
    }
}

/// Concurrent aggregations: `--concurrency`, then `[aggregation] max-concurrent`
pub fn args_to_concurrency(args: &Args, config_manager: &ConfigManager) -> Result<usize, CliError> {
    match args.concurrency {
        Some(0) => Err(CliError::InvalidConcurrency { value: 0 }),
        Some(value) => Ok(value),
        None => config_manager.get_max_concurrent().map_err(CliError::configuration),
    }
}
