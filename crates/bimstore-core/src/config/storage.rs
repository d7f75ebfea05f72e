//! Upload and output directory configuration.

use serde::{Deserialize, Serialize};

/// Storage locations and accepted upload types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one sub-folder per uploaded model.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Output root for converter results.
    #[serde(default = "default_converted_dir")]
    pub converted_dir: String,
    /// Maximum request body size for uploads, in bytes (default 512 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Accepted model file extensions, including the leading dot.
    #[serde(default = "default_model_extensions")]
    pub model_extensions: Vec<String>,
    /// Accepted preview image extensions, including the leading dot.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            converted_dir: default_converted_dir(),
            max_upload_size_bytes: default_max_upload(),
            model_extensions: default_model_extensions(),
            image_extensions: default_image_extensions(),
        }
    }
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_converted_dir() -> String {
    "converted".to_string()
}

fn default_max_upload() -> u64 {
    536_870_912 // 512 MB
}

fn default_model_extensions() -> Vec<String> {
    vec![".ifc".to_string()]
}

fn default_image_extensions() -> Vec<String> {
    vec![".png".to_string(), ".jpg".to_string(), ".jpeg".to_string()]
}
