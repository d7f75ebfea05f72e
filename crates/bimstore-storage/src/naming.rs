//! Validation of client-supplied names.

use bimstore_core::{AppError, AppResult};

/// Reject names that could address anything outside a single directory
/// entry: empty names, path separators and `..`.
pub fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("File name must not be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::validation(format!(
            "Invalid file name '{name}': path separators are not allowed"
        )));
    }
    Ok(())
}

/// Case-insensitive suffix check against extensions given with their dot.
pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()))
}

/// Folder name for a model file: the name without its last extension.
pub fn model_folder(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}
