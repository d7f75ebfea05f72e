//! Response DTOs.

use serde::{Deserialize, Serialize};

use bimstore_storage::ModelEntry;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Result of `POST /upload/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Confirmation text.
    pub message: String,
    /// Stored model path.
    pub ifc_file: String,
    /// Stored image path.
    pub img_file: String,
}

/// Result of `GET /files/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    /// Stored models.
    pub files: Vec<ModelEntry>,
}

/// Plain confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Confirmation text.
    pub message: String,
}

/// Result of a successful `POST /convert/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// Confirmation text.
    pub message: String,
    /// Mesh output path.
    pub mesh_path: String,
    /// Metadata output path.
    pub metadata_path: String,
}
