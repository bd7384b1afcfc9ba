use anyhow::Result;
use std::sync::Arc;

use crate::config::ValidationResult;
use crate::Config;

/// Application configuration holder and lifecycle manager
pub struct App {
    config: Arc<Config>,
    validation: ValidationResult,
}

impl App {
    /// Load and validate configuration from the default location
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self::with_config(config, validation))
    }

    /// Build an app around an already-loaded configuration
    pub fn with_config(config: Config, validation: ValidationResult) -> Self {
        tracing::info!(
            "Using weather backend at {} (refresh every {} ms)",
            config.api.base_url,
            config.dashboard.refresh_interval_ms
        );

        Self {
            config: Arc::new(config),
            validation,
        }
    }

    /// Shared handle to the configuration
    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Warnings produced while validating the configuration
    pub fn warnings(&self) -> &[crate::config::ConfigValidationError] {
        &self.validation.warnings
    }

    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down SkyWatch");
        Ok(())
    }
}
