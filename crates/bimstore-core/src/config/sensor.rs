//! Background sensor feed configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the periodically refreshed dummy sensor reading.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Whether the feed is started with the server.
    pub enabled: bool,
    /// Name reported with every reading.
    #[validate(length(min = 1))]
    pub name: String,
    /// Refresh interval in milliseconds.
    #[validate(range(min = 10, max = 3_600_000))]
    pub interval_ms: u64,
    /// Lower bound (inclusive) of generated values.
    pub min_value: u32,
    /// Upper bound (inclusive) of generated values.
    pub max_value: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "DummyData".to_string(),
            interval_ms: 1000,
            min_value: 0,
            max_value: 100,
        }
    }
}
