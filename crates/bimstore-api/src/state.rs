//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use bimstore_converter::{ConversionOrchestrator, DynProcessRunner};
use bimstore_core::config::AppConfig;
use bimstore_storage::ModelStore;
use bimstore_worker::SensorReading;

/// Orchestrator type held by the server.
pub type Orchestrator = ConversionOrchestrator<DynProcessRunner>;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Uploaded model storage
    pub store: Arc<ModelStore>,
    /// Conversion orchestrator
    pub orchestrator: Arc<Orchestrator>,
    /// Latest sensor reading
    pub sensor: Arc<RwLock<SensorReading>>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Assemble the state.
    pub fn new(
        config: AppConfig,
        store: ModelStore,
        orchestrator: Orchestrator,
        sensor: Arc<RwLock<SensorReading>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            orchestrator: Arc::new(orchestrator),
            sensor,
            started_at: Instant::now(),
        }
    }
}
