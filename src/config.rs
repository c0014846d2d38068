use crate::constants::{
    DEFAULT_CATALOG_PATH, DEFAULT_CONFIG_PATH, DEFAULT_CORS_ORIGINS, DEFAULT_LOG_DIR, DEFAULT_MAX_RESULTS,
    DEFAULT_PORT,
};
use crate::engine::MatchOptions;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Service configuration. Sources, lowest precedence first: built-in defaults,
/// `config.toml`, environment variables, command-line flags.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// File path or http(s) URL of the catalog JSON
    pub location: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_CATALOG_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    /// 0 disables the cap
    pub max_results: usize,
    /// Log the per-program predicate breakdown of every query
    pub diagnostics: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            diagnostics: false,
        }
    }
}

impl MatchingConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            max_results: (self.max_results > 0).then_some(self.max_results),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling JSON log files; unset logs to the console only
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus listener address; unset disables the exporter
    pub addr: Option<SocketAddr>,
}

impl Config {
    /// Load from `path`, or from `config.toml` when it exists. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !required && !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup, using the same keys as the environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(location) = lookup("FUNDING_CATALOG") {
            self.catalog.location = location;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(max) = lookup("FUNDING_MAX_RESULTS") {
            self.matching.max_results = parse_value("FUNDING_MAX_RESULTS", &max)?;
        }
        if let Some(origins) = lookup("FUNDING_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(addr) = lookup("FUNDING_METRICS_ADDR") {
            self.metrics.addr = Some(parse_value("FUNDING_METRICS_ADDR", &addr)?);
        }
        if let Some(dir) = lookup("FUNDING_LOG_DIR") {
            self.logging.dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(flag) = lookup("FUNDING_DIAGNOSTICS") {
            self.matching.diagnostics = parse_value("FUNDING_DIAGNOSTICS", &flag)?;
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
