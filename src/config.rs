use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result};
use toml::Value;
use log::{debug, info};
use crate::collector::CollectorConfig;
use crate::source::GitHubConfig;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "GITOMETER_CONFIG";
/// Environment variable holding the GitHub access token
pub const TOKEN_ENV: &str = "GITOMETER_GITHUB_ACCESS_TOKEN";
/// Default number of repositories aggregated at once
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
    selected_section: Option<String>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
            selected_section: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::from_config(Configuration::new()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
            selected_section: None,
        })
    }

    pub fn config_file_path(&self) -> Option<&PathBuf> {
        self.config_file_path.as_ref()
    }

    /// Get value from configuration with section fallback
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        // Priority: selected_section -> specified section -> base
        if let Some(selected) = &self.selected_section {
            if let Some(value) = self.config.get(selected).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }

        if let Some(value) = self.config.get(section).and_then(|s| s.get(key)) {
            return Some(value);
        }

        self.config.get("base").and_then(|s| s.get(key))
    }

    /// Select configuration section for --config-name
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.selected_section = Some(section);
    }

    /// Sections present in the loaded file
    pub fn has_section(&self, section: &str) -> bool {
        self.config.contains_key(section)
    }

    /// Get a numeric value with type conversion
    pub fn get_number<T>(&self, section: &str, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get_value(section, key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("Invalid {}.{} value in config: {}", section, key, value)),
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// GitHub connection settings from `[source]`, with the access token
    /// falling back to `$GITOMETER_GITHUB_ACCESS_TOKEN`
    pub fn get_source_config(&self) -> Result<GitHubConfig> {
        self.source_config_with_token(env::var(TOKEN_ENV).ok())
    }

    fn source_config_with_token(&self, env_token: Option<String>) -> Result<GitHubConfig> {
        let mut config = GitHubConfig::default();

        if let Some(api_url) = self.get_value("source", "api-url") {
            config.api_url = api_url.clone();
        }
        if let Some(user_agent) = self.get_value("source", "user-agent") {
            config.user_agent = user_agent.clone();
        }
        if let Some(per_page) = self.get_number::<u32>("source", "per-page")? {
            config.per_page = per_page;
        }
        if let Some(secs) = self.get_number::<u64>("source", "timeout-secs")? {
            config.timeout = Duration::from_secs(secs);
        }

        config.token = self
            .get_value("source", "token")
            .cloned()
            .or(env_token)
            .filter(|t| !t.trim().is_empty());

        config.validate()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Source configuration validation failed")?;

        Ok(config)
    }

    /// Collector pacing and bounds from `[collector]`
    pub fn get_collector_config(&self) -> Result<CollectorConfig> {
        let mut config = CollectorConfig::default();

        if let Some(ms) = self.get_number::<u64>("collector", "page-delay-ms")? {
            config.page_delay = Duration::from_millis(ms);
        }
        if let Some(max_pages) = self.get_number::<u32>("collector", "max-pages")? {
            config.max_pages = max_pages;
        }
        if let Some(secs) = self.get_number::<u64>("collector", "deadline-secs")? {
            // 0 disables the deadline
            config.deadline = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Collector configuration validation failed")?;

        Ok(config)
    }

    /// Location of the JSON snapshot store
    pub fn get_store_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.get_path("store", "path") {
            return Ok(expand_tilde(path));
        }
        default_store_path()
    }

    /// Number of repositories aggregated concurrently
    pub fn get_max_concurrent(&self) -> Result<usize> {
        let value = self
            .get_number::<usize>("aggregation", "max-concurrent")?
            .unwrap_or(DEFAULT_MAX_CONCURRENT);
        if value == 0 {
            anyhow::bail!("aggregation.max-concurrent must be greater than 0");
        }
        Ok(value)
    }
}

/// `<data_dir>/gitometer/snapshots.json`
pub fn default_store_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("gitometer").join("snapshots.json"))
        .context("Cannot determine a data directory for the snapshot store; set [store] path or --store")
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or(path),
        Err(_) => path,
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Environment variable $GITOMETER_CONFIG
    if let Ok(env_path) = env::var(CONFIG_ENV) {
        paths.push(PathBuf::from(env_path));
    }

    // 2. XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("gitometer").join("config.toml"));
    }

    // 3. Home directory
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".gitometer.toml"));
    }

    // 4. Project local
    paths.push(PathBuf::from("./.gitometer.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let toml_value: Value = content.parse()
        .context("Failed to parse TOML content")?;

    let mut config = Configuration::new();

    if let Value::Table(table) = toml_value {
        flatten_toml_table(&table, String::new(), &mut config);
    }

    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) if subtable.values().all(|v| !v.is_table()) => {
                let section_map = subtable
                    .iter()
                    .map(|(subkey, subvalue)| (subkey.clone(), toml_value_to_string(subvalue)))
                    .collect();
                config.insert(section_name, section_map);
            }
            Value::Table(subtable) => flatten_toml_table(subtable, section_name, config),
            // Top-level keys outside any table belong to [base]
            _ if prefix.is_empty() => {
                config
                    .entry("base".to_string())
                    .or_default()
                    .insert(key.clone(), toml_value_to_string(value));
            }
            _ => {
                config
                    .entry(prefix.clone())
                    .or_default()
                    .insert(key.clone(), toml_value_to_string(value));
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => value.to_string(),
    }
}
