//! Conversion metrics handler.

use axum::Json;
use axum::extract::State;

use bimstore_converter::MetricsSnapshot;

use crate::state::AppState;

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.orchestrator.metrics_snapshot())
}
