//! Request DTOs.

use serde::{Deserialize, Serialize};

/// Form body of `POST /convert/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Stored model file name, e.g. `tower.ifc`.
    pub filename: String,
}
