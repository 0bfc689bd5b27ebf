//! TOML configuration loading and validation.
//!
//! Without an explicit path, the working directory is searched for `*.toml`
//! files whose first line is the `[mattermost]` table header; exactly one
//! such file must exist.

use mf_core::{FeedSetConfig, MAX_RESCAN_INTERVAL};
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const CONFIG_MARKER: &str = "[mattermost]";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("configuration validation failed: {0}")]
    Invalid(String),

    #[error("no valid config files found")]
    NotFound,

    #[error("multiple valid config files found: {0:?}")]
    Ambiguous(Vec<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mattermost: MattermostConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MattermostConfig {
    #[serde(default)]
    pub secret_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedsConfig {
    #[serde(default)]
    pub urls: Vec<String>,
    /// Seconds between scans
    #[serde(default)]
    pub rescan_delay: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub output_to_terminal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub port: i64,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mattermost.secret_url.is_empty() {
            return Err(ConfigError::Invalid("mattermost.secret_url must be provided".to_string()));
        }
        Url::parse(&self.mattermost.secret_url).map_err(|e| {
            ConfigError::Invalid(format!("invalid mattermost.secret_url: {}", e))
        })?;

        if self.feeds.urls.is_empty() {
            return Err(ConfigError::Invalid(
                "feeds.urls must contain at least one URL".to_string(),
            ));
        }
        for feed_url in &self.feeds.urls {
            Url::parse(feed_url).map_err(|e| {
                ConfigError::Invalid(format!("invalid feeds.url {}: {}", feed_url, e))
            })?;
        }
        if self.feeds.rescan_delay <= 0 {
            return Err(ConfigError::Invalid(
                "feeds.rescan_delay must be greater than zero".to_string(),
            ));
        }
        if self.feeds.rescan_delay as u64 > MAX_RESCAN_INTERVAL.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "feeds.rescan_delay must be at most {} seconds",
                MAX_RESCAN_INTERVAL.as_secs()
            )));
        }

        if !(1..=65535).contains(&self.api.port) {
            return Err(ConfigError::Invalid("api.port must be between 1 and 65535".to_string()));
        }

        Ok(())
    }

    /// Feed settings for the scan engine. Call after [`Config::validate`].
    pub fn feed_set(&self) -> FeedSetConfig {
        FeedSetConfig::new(
            self.feeds.urls.clone(),
            Duration::from_secs(self.feeds.rescan_delay.max(0) as u64),
        )
    }

    pub fn port(&self) -> u16 {
        u16::try_from(self.api.port).unwrap_or_default()
    }
}

/// Load and validate the config at `path`, or discover one in the working directory.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let filename = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
                path: PathBuf::from("."),
                source,
            })?;
            discover_config(&cwd)?
        }
    };
    load_from_path(&filename)
}

pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// The single config file in `dir`, if exactly one exists.
pub fn discover_config(dir: &Path) -> Result<PathBuf, ConfigError> {
    let mut candidates = find_valid_config_files(dir).map_err(|source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    match candidates.len() {
        0 => Err(ConfigError::NotFound),
        1 => Ok(candidates.remove(0)),
        _ => Err(ConfigError::Ambiguous(candidates)),
    }
}

pub fn find_valid_config_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_toml = path.extension().map_or(false, |ext| ext == "toml");
        if is_toml && path.is_file() && is_valid_config_file(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn is_valid_config_file(path: &Path) -> bool {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Error opening file {}: {}", path.display(), e);
            return false;
        }
    };

    let mut first_line = String::new();
    match BufReader::new(file).read_line(&mut first_line) {
        Ok(_) => first_line.starts_with(CONFIG_MARKER),
        Err(_) => false,
    }
}
