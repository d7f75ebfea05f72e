//! Storage-facing data types.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file received from a client, held in memory until stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub filename: String,
    /// File content.
    pub data: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file.
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Where an upload pair was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedUpload {
    /// Stored model path.
    pub model_path: PathBuf,
    /// Stored preview image path.
    pub image_path: PathBuf,
}

/// One stored model, as listed by `GET /files/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Model file name.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation time, falling back to modification time where the
    /// filesystem does not record it.
    pub created_at: DateTime<Utc>,
}
