//! Sensor reading handler.

use axum::Json;
use axum::extract::State;

use bimstore_worker::SensorReading;

use crate::state::AppState;

/// GET /sensordata
pub async fn sensor_data(State(state): State<AppState>) -> Json<SensorReading> {
    Json(state.sensor.read().await.clone())
}
