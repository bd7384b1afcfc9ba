use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{AppError, ConfigError};

/// Refresh interval used when none is configured (5 minutes).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 300_000;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "SKYWATCH_API_URL";

/// Environment variable overriding `dashboard.refresh_interval_ms`.
pub const ENV_UPDATE_INTERVAL: &str = "SKYWATCH_UPDATE_INTERVAL";

/// Cities the backend collects data for.
const KNOWN_CITIES: &[&str] = &[
    "Delhi",
    "Mumbai",
    "Chennai",
    "Bangalore",
    "Kolkata",
    "Hyderabad",
];

/// Parse a refresh interval in milliseconds.
///
/// Unset, non-numeric, zero or negative values fall back to
/// [`DEFAULT_REFRESH_INTERVAL_MS`].
pub fn parse_refresh_interval(raw: Option<&str>) -> u64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|ms| ms.is_finite() && *ms >= 1.0)
        .map(|ms| ms as u64)
        .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS)
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather backend connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling and display settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the weather backend (without the `/api` suffix)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Interval between background fetch cycles, in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Number of days requested for the historical summary
    #[serde(default = "default_summary_days")]
    pub summary_days: u32,

    /// City selected on startup
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Interval between connection-status checks, in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub health_check_interval_ms: u64,
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_summary_days() -> u32 {
    7
}

fn default_city() -> String {
    "Delhi".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            summary_days: default_summary_days(),
            default_city: default_city(),
            health_check_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides(
            std::env::var(ENV_API_URL).ok().as_deref(),
            std::env::var(ENV_UPDATE_INTERVAL).ok().as_deref(),
        );
        Ok(config)
    }

    /// Load configuration from `path`, writing the defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).map_err(AppError::Io)?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Apply `SKYWATCH_API_URL` / `SKYWATCH_UPDATE_INTERVAL` values.
    ///
    /// An empty URL is ignored. When the interval variable is present it
    /// always wins, with unparseable values mapping to the default.
    pub fn apply_env_overrides(&mut self, api_url: Option<&str>, update_interval: Option<&str>) {
        if let Some(url) = api_url.map(str::trim).filter(|u| !u.is_empty()) {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
        if update_interval.is_some() {
            self.dashboard.refresh_interval_ms = parse_refresh_interval(update_interval);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        }

        if self.dashboard.refresh_interval_ms == 0 {
            result.add_error(
                "dashboard.refresh_interval_ms",
                "Refresh interval must be greater than 0",
            );
        } else if self.dashboard.refresh_interval_ms > 86_400_000 {
            result.add_warning(
                "dashboard.refresh_interval_ms",
                "Refresh interval is more than 24 hours",
            );
        } else if self.dashboard.refresh_interval_ms < 1_000 {
            result.add_warning(
                "dashboard.refresh_interval_ms",
                "Refresh interval is under one second",
            );
        }

        if self.dashboard.health_check_interval_ms == 0 {
            result.add_error(
                "dashboard.health_check_interval_ms",
                "Health check interval must be greater than 0",
            );
        }

        if self.dashboard.summary_days == 0 {
            result.add_error("dashboard.summary_days", "Summary must cover at least one day");
        }

        if !KNOWN_CITIES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.dashboard.default_city))
        {
            result.add_warning(
                "dashboard.default_city",
                format!(
                    "Unknown city '{}' - the backend may have no data for it",
                    self.dashboard.default_city
                ),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(AppError::Io)?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).map_err(AppError::Io)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no user config directory".to_string()))?
            .join("skywatch");

        Ok(config_dir.join("config.toml"))
    }
}
