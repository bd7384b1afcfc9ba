pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{
    parse_refresh_interval, ApiConfig, Config, DashboardConfig, ValidationResult,
    DEFAULT_REFRESH_INTERVAL_MS,
};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize logging for the SkyWatch process.
///
/// Reads the filter from `RUST_LOG`, falling back to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("SkyWatch core initialized");
    Ok(())
}
