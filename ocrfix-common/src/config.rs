//! Bootstrap configuration for ocrfix services
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`OCRFIX_*`)
//! 3. TOML configuration file
//! 4. Compiled defaults (fallback)
//!
//! A missing configuration file at the default location is not an error:
//! a warning is logged and compiled defaults are used. A file that was
//! named explicitly must exist and parse.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the service bind host
pub const ENV_HOST: &str = "OCRFIX_HOST";
/// Environment variable naming the service port
pub const ENV_PORT: &str = "OCRFIX_PORT";
/// Environment variable naming the backend base URL
pub const ENV_BACKEND_URL: &str = "OCRFIX_BACKEND_URL";
/// Environment variable naming the correction pipeline endpoint
pub const ENV_PIPELINE_URL: &str = "OCRFIX_PIPELINE_URL";
/// Environment variable naming the default log level
pub const ENV_LOG_LEVEL: &str = "OCRFIX_LOG_LEVEL";

/// Complete bootstrap configuration
///
/// Every section is optional in the TOML file; absent sections and keys
/// take their compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// HTTP front door settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5055,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Remote backend (system of record) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL, without trailing slash after normalization
    pub base_url: String,
    /// Timeout applied to ordinary backend calls; none by default
    pub request_timeout_secs: Option<u64>,
    /// Timeout applied to the health probe
    pub health_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: None,
            health_timeout_secs: 5,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

/// External correction pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Endpoint receiving `POST {"inputs": {...}}`
    pub url: String,
    /// Optional timeout for one pipeline run; unbounded by default
    pub timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8100/kickoff".to_string(),
            timeout_secs: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Values that override the TOML file, collected from the command line
/// or from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend_url: Option<String>,
    pub pipeline_url: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// Read overrides from `OCRFIX_*` environment variables
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let port = std::env::var(ENV_PORT).ok().and_then(|raw| match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(e) => {
                warn!("Ignoring {}={:?}: {}", ENV_PORT, raw, e);
                None
            }
        });

        Self {
            host: non_empty_env(ENV_HOST),
            port,
            backend_url: non_empty_env(ENV_BACKEND_URL),
            pipeline_url: non_empty_env(ENV_PIPELINE_URL),
            log_level: non_empty_env(ENV_LOG_LEVEL),
        }
    }

    /// Field-wise merge: values present in `self` win over `fallback`
    pub fn or(self, fallback: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            backend_url: self.backend_url.or(fallback.backend_url),
            pipeline_url: self.pipeline_url.or(fallback.pipeline_url),
            log_level: self.log_level.or(fallback.log_level),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TomlConfig {
    /// Apply overrides on top of file/default values
    pub fn apply(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = &overrides.backend_url {
            self.backend.base_url = url.clone();
        }
        if let Some(url) = &overrides.pipeline_url {
            self.pipeline.url = url.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        self.normalized()
    }

    /// Strip trailing slashes from the backend base URL so paths can be
    /// appended with a leading `/`
    pub fn normalized(mut self) -> Self {
        self.backend.base_url = self.backend.base_url.trim_end_matches('/').to_string();
        self
    }

    /// Check values that would only fail later at bind or request time
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.is_empty() {
            return Err(Error::Config("backend.base_url must not be empty".to_string()));
        }
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "backend.base_url must be an http(s) URL: {}",
                self.backend.base_url
            )));
        }
        if self.pipeline.url.is_empty() {
            return Err(Error::Config("pipeline.url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Default configuration file location: `<config_dir>/ocrfix/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ocrfix").join("config.toml"))
}

/// Parse TOML text into a configuration
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str::<TomlConfig>(content)
        .map(TomlConfig::normalized)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load the configuration file
///
/// With an explicit path the file must exist. Without one, the default
/// location is tried and its absence falls back to compiled defaults.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return read_config_file(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => read_config_file(&path),
        Some(path) => {
            warn!(
                "No config file at {}; using compiled defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory; using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_toml_config(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the effective configuration from all four tiers
pub fn resolve_config(
    explicit_path: Option<&Path>,
    cli: ConfigOverrides,
) -> Result<TomlConfig> {
    let file_config = load_toml_config(explicit_path)?;
    let overrides = cli.or(ConfigOverrides::from_env());
    let config = file_config.apply(&overrides);
    config.validate()?;
    Ok(config)
}
