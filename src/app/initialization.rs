//! Application initialization and configuration

use anyhow::{Context, Result};
use log::{debug, LevelFilter};
use std::str::FromStr;
use std::sync::Arc;

use crate::collector::CollectorConfig;
use crate::source::{ActivitySource, GitHubClient};
use crate::store::JsonFileStore;
use crate::{cli, config, logging, output};

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = match &args.config_file {
        Some(config_file) => config::ConfigManager::load_from_file(config_file.clone())?,
        None => config::ConfigManager::load()?,
    };

    if let Some(section_name) = &args.config_name {
        if !manager.has_section(section_name) {
            anyhow::bail!("Configuration section '{}' not found", section_name);
        }
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config
            .get_log_level("base", "console-level")
            .context("Invalid console-level in configuration")?
            .unwrap_or(LevelFilter::Info)
    };

    let format = match (&args.log_format, config.get_value("base", "log-format")) {
        (Some(format_str), _) => logging::LogFormat::from_str(format_str).map_err(|e| anyhow::anyhow!(e))?,
        (None, Some(format_str)) => logging::LogFormat::from_str(format_str)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid log-format in configuration")?,
        (None, None) => logging::LogFormat::Text,
    };

    let log_file_path = args.log_file.clone().or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => config
            .get_log_level("base", "file-log-level")
            .context("Invalid file-log-level in configuration")?,
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(file_path), level) => {
            // Without an explicit file level the file mirrors the console
            let level = level.unwrap_or(console_level);
            (logging::LogDestination::Both(file_path), Some(level))
        }
        (None, None) => (logging::LogDestination::Console, None),
        (None, Some(_)) => anyhow::bail!("Log file level specified without log file"),
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Create a ColourManager from CLI arguments
pub fn create_colour_manager(args: &cli::Args) -> output::ColourManager {
    output::ColourManager::from_args(args.no_color)
}

/// GitHub client from `[source]` settings
pub fn create_source(config: &config::ConfigManager) -> Result<Arc<dyn ActivitySource>> {
    let source_config = config.get_source_config()?;
    debug!("Using GitHub API at {}", source_config.api_url);
    let client = GitHubClient::new(source_config).context("Failed to create GitHub client")?;
    Ok(Arc::new(client))
}

/// Snapshot store at the configured location
pub async fn open_store(args: &cli::Args, config: &config::ConfigManager) -> Result<JsonFileStore> {
    let path = cli::converter::args_to_store_path(args, config)?;
    debug!("Using snapshot store {}", path.display());
    JsonFileStore::open(&path)
        .await
        .with_context(|| format!("Failed to open snapshot store {}", path.display()))
}

pub fn collector_config(args: &cli::Args, config: &config::ConfigManager) -> Result<CollectorConfig> {
    Ok(cli::converter::args_to_collector_config(args, Some(config))?)
}
