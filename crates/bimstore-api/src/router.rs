//! Route definitions for the BIM Store HTTP API.
//!
//! Paths keep their trailing slashes (`/upload/`, `/files/`, `/convert/`)
//! because existing clients call them that way.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes, the upload size limit and request
/// logging.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_size_bytes as usize;

    Router::new()
        .merge(model_routes())
        .merge(conversion_routes())
        .merge(service_routes())
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Upload, list, download, delete
fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/", post(handlers::model::upload))
        .route("/files/", get(handlers::model::list_files))
        .route("/download/{folder}", get(handlers::model::download_folder))
        .route("/delete/{filename}", delete(handlers::model::delete_model))
}

/// Conversion and its metrics
fn conversion_routes() -> Router<AppState> {
    Router::new()
        .route("/convert/", post(handlers::convert::convert))
        .route("/metrics", get(handlers::metrics::metrics))
}

/// Health and sensor feed
fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/sensordata", get(handlers::sensor::sensor_data))
}
