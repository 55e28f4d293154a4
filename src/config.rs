//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation of the dashboard credentials required to serve

use crate::error::AppError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Dashboard API configuration
    pub dashboard: DashboardConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Geolocation banner configuration
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_key: String,
    pub org_name: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            org_name: String::new(),
            base_url: "https://api.meraki.com/api/v1".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            per_page: 1000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            session_ttl_secs: 4 * 3600,
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://get.geojs.io/v1".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    /// An explicit path must exist; otherwise the first well-known file found is used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                info!(config_file = %path.display(), "Loading configuration from file");
                Self::load_from_file(path)?
            }
            None => Self::discover()?,
        };

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    fn discover() -> Result<Self> {
        let config_paths = [
            PathBuf::from("meraki-app-usage.toml"),
            PathBuf::from(".meraki-app-usage.toml"),
            dirs::config_dir()
                .map(|d| d.join("meraki-app-usage").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                return Self::load_from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("APP_USAGE_LOG_DIR") {
            self.logging.directory = PathBuf::from(val);
        }

        // Dashboard overrides
        if let Ok(val) = env::var("MERAKI_API_KEY") {
            self.dashboard.api_key = val;
        }
        if let Ok(val) = env::var("MERAKI_ORG_NAME") {
            self.dashboard.org_name = val;
        }
        if let Ok(val) = env::var("MERAKI_BASE_URL") {
            self.dashboard.base_url = val;
        }
        if let Ok(val) = env::var("MERAKI_MAX_RETRIES") {
            self.dashboard.max_retries = val.parse()
                .context("Invalid MERAKI_MAX_RETRIES")?;
        }
        if let Ok(val) = env::var("MERAKI_PER_PAGE") {
            self.dashboard.per_page = val.parse()
                .context("Invalid MERAKI_PER_PAGE")?;
        }

        // Server overrides
        if let Ok(val) = env::var("APP_USAGE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("APP_USAGE_PORT") {
            self.server.port = val.parse()
                .context("Invalid APP_USAGE_PORT")?;
        }

        // Geolocation overrides
        if let Ok(val) = env::var("APP_USAGE_GEO_ENABLED") {
            self.geo.enabled = val.parse()
                .context("Invalid APP_USAGE_GEO_ENABLED")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.dashboard.api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "Dashboard API key is missing; set MERAKI_API_KEY or dashboard.api_key".to_string(),
            )
            .into());
        }

        if self.dashboard.org_name.trim().is_empty() {
            return Err(AppError::Configuration(
                "Organization name is missing; set MERAKI_ORG_NAME or dashboard.org_name".to_string(),
            )
            .into());
        }

        if !(3..=1000).contains(&self.dashboard.per_page) {
            return Err(AppError::Configuration(format!(
                "Dashboard page size must be between 3 and 1000, got {}",
                self.dashboard.per_page
            ))
            .into());
        }

        if self.dashboard.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "Dashboard timeout must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.session_ttl_secs < 60 {
            warn!(
                session_ttl_secs = self.server.session_ttl_secs,
                "Session lifetime is very short, reports may disappear between page loads"
            );
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
