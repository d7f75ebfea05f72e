//! External converter configuration.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Settings for the external model converter and the output layout it
/// writes into.
///
/// Output extensions are explicit constants here: the converter picks its
/// output format from the destination extension, so the extension is what
/// selects mesh vs. metadata output.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Converter executable, either a bare name resolved through `PATH` or a
    /// full path.
    #[validate(length(min = 1))]
    pub executable: String,

    /// Extension (without dot) of the mesh output.
    #[validate(length(min = 1, max = 16))]
    pub mesh_extension: String,

    /// Extension (without dot) of the metadata sidecar.
    #[validate(length(min = 1, max = 16))]
    pub metadata_extension: String,

    /// Sub-directory of the output root receiving mesh files.
    #[validate(length(min = 1))]
    pub mesh_dir: String,

    /// Sub-directory of the output root receiving metadata files.
    #[validate(length(min = 1))]
    pub metadata_dir: String,

    /// Extra arguments appended to the mesh invocation only.
    pub mesh_flags: Vec<String>,

    /// Serialize concurrent conversions that target the same output paths.
    pub serialize_same_target: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable: "IfcConvert".to_string(),
            mesh_extension: "obj".to_string(),
            metadata_extension: "xml".to_string(),
            mesh_dir: "obj".to_string(),
            metadata_dir: "xml".to_string(),
            mesh_flags: vec!["--use-element-guids".to_string()],
            serialize_same_target: true,
        }
    }
}

impl ConverterConfig {
    /// Check that both output kinds stay inside the output root and never
    /// resolve to the same file.
    pub fn validate_layout(&self) -> Result<(), AppError> {
        for (key, dir) in [("mesh_dir", &self.mesh_dir), ("metadata_dir", &self.metadata_dir)] {
            let escapes = Path::new(dir).components().any(|c| {
                matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
            });
            if escapes {
                return Err(AppError::configuration(format!(
                    "converter.{key} ({dir}) must be a relative path inside the output root"
                )));
            }
        }

        let same_dir = Path::new(&self.mesh_dir) == Path::new(&self.metadata_dir);
        let same_ext = self
            .mesh_extension
            .trim_start_matches('.')
            .eq_ignore_ascii_case(self.metadata_extension.trim_start_matches('.'));
        if same_dir && same_ext {
            return Err(AppError::configuration(
                "converter mesh and metadata outputs must differ in directory or extension",
            ));
        }
        Ok(())
    }
}
