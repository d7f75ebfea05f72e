//! # bimstore-api
//!
//! HTTP API layer for BIM Store built on Axum.
//!
//! Exposes upload, listing, download, deletion and conversion of stored
//! models, the sensor reading, health and conversion metrics.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
