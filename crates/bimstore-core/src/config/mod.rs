//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files plus `BIMSTORE__*` environment variables. Each
//! sub-module represents a logical configuration section, and every section
//! has defaults so the server starts without any file present.

pub mod app;
pub mod converter;
pub mod logging;
pub mod sensor;
pub mod storage;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::app::{CorsConfig, ServerConfig};
pub use self::converter::ConverterConfig;
pub use self::logging::LoggingConfig;
pub use self::sensor::SensorConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Upload and output directory settings.
    pub storage: StorageConfig,
    /// External converter settings.
    pub converter: ConverterConfig,
    /// Background sensor feed settings.
    pub sensor: SensorConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Merges `config/default`, `config/{env}` and environment variables
    /// prefixed with `BIMSTORE` (e.g. `BIMSTORE__SERVER__PORT=9000`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BIMSTORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from a single explicit file (used by the CLI).
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("BIMSTORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate every section that carries constraints.
    pub fn validate(&self) -> Result<(), AppError> {
        self.converter.validate()?;
        self.converter.validate_layout()?;
        self.sensor.validate()?;
        if self.sensor.min_value > self.sensor.max_value {
            return Err(AppError::configuration(format!(
                "sensor.min_value ({}) must not exceed sensor.max_value ({})",
                self.sensor.min_value, self.sensor.max_value
            )));
        }
        Ok(())
    }
}
