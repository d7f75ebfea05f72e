//! Output directory layout: creation of the output tree and deterministic
//! path computation for inputs and outputs.

use std::path::{Path, PathBuf};

use bimstore_core::config::ConverterConfig;
use tracing::debug;

use crate::error::ConversionError;
use crate::models::OutputKind;

/// Maps input filenames to output paths under an output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    mesh_dir: String,
    metadata_dir: String,
    mesh_extension: String,
    metadata_extension: String,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

impl StorageLayout {
    /// Build the layout from converter configuration.
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            mesh_dir: config.mesh_dir.clone(),
            metadata_dir: config.metadata_dir.clone(),
            mesh_extension: config.mesh_extension.trim_start_matches('.').to_string(),
            metadata_extension: config.metadata_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Sub-directory of the output root for `kind`.
    pub fn subdir(&self, kind: OutputKind) -> &str {
        match kind {
            OutputKind::Mesh => &self.mesh_dir,
            OutputKind::Metadata => &self.metadata_dir,
        }
    }

    /// File extension (without dot) for `kind`.
    pub fn extension(&self, kind: OutputKind) -> &str {
        match kind {
            OutputKind::Mesh => &self.mesh_extension,
            OutputKind::Metadata => &self.metadata_extension,
        }
    }

    /// Create `output_root` and both kind sub-directories if absent.
    ///
    /// Succeeds when the directories already exist.
    pub async fn ensure_layout(&self, output_root: &Path) -> Result<(), ConversionError> {
        for dir in [
            output_root.to_path_buf(),
            output_root.join(&self.mesh_dir),
            output_root.join(&self.metadata_dir),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| ConversionError::DirectoryCreation {
                    path: dir.clone(),
                    source,
                })?;
        }
        debug!(output_root = %output_root.display(), "Output layout ready");
        Ok(())
    }

    /// `<output_root>/<subdir(kind)>/<stem>.<extension(kind)>`.
    ///
    /// Only the final component of `filename` is used, so an input name can
    /// never place an output outside `output_root`.
    pub fn resolve_output_path(
        &self,
        output_root: &Path,
        filename: &str,
        kind: OutputKind,
    ) -> PathBuf {
        let stem = Self::stem(filename);
        output_root
            .join(self.subdir(kind))
            .join(format!("{}.{}", stem, self.extension(kind)))
    }

    /// `<input_root>/<filename>`; existence is not checked.
    pub fn resolve_input_path(input_root: &Path, filename: &str) -> PathBuf {
        input_root.join(filename)
    }

    /// Filename without its last extension (`tower.v2.ifc` -> `tower.v2`).
    pub fn stem(filename: &str) -> String {
        Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(filename)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths_are_deterministic() {
        let layout = StorageLayout::default();
        let root = Path::new("/srv/converted");

        let first = layout.resolve_output_path(root, "model.ifc", OutputKind::Mesh);
        let second = layout.resolve_output_path(root, "model.ifc", OutputKind::Mesh);
        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("/srv/converted/obj/model.obj"));

        let metadata = layout.resolve_output_path(root, "model.ifc", OutputKind::Metadata);
        assert_eq!(metadata, PathBuf::from("/srv/converted/xml/model.xml"));
    }

    #[test]
    fn test_mesh_and_metadata_differ_only_in_dir_and_extension() {
        let layout = StorageLayout::default();
        let root = Path::new("out");
        for name in ["a.ifc", "Tower Block.ifc", "site.v2.ifc", "noext"] {
            let mesh = layout.resolve_output_path(root, name, OutputKind::Mesh);
            let meta = layout.resolve_output_path(root, name, OutputKind::Metadata);
            assert_eq!(mesh.file_stem(), meta.file_stem());
            assert_eq!(mesh.parent().and_then(|p| p.parent()), Some(root));
            assert_eq!(meta.parent().and_then(|p| p.parent()), Some(root));
            assert_ne!(mesh, meta);
        }
    }

    #[test]
    fn test_stem_strips_only_last_extension() {
        assert_eq!(StorageLayout::stem("site.v2.ifc"), "site.v2");
        assert_eq!(StorageLayout::stem("model"), "model");
        assert_eq!(StorageLayout::stem("nested/dir/model.ifc"), "model");
    }

    #[test]
    fn test_configured_extensions_accept_leading_dot() {
        let config = ConverterConfig {
            mesh_extension: ".glb".to_string(),
            mesh_dir: "mesh".to_string(),
            metadata_dir: "metadata".to_string(),
            ..Default::default()
        };
        let layout = StorageLayout::from_config(&config);
        assert_eq!(
            layout.resolve_output_path(Path::new("r"), "model.ifc", OutputKind::Mesh),
            PathBuf::from("r/mesh/model.glb")
        );
        assert_eq!(
            layout.resolve_output_path(Path::new("r"), "model.ifc", OutputKind::Metadata),
            PathBuf::from("r/metadata/model.xml")
        );
    }

    #[test]
    fn test_resolve_input_path_is_a_plain_join() {
        let path = StorageLayout::resolve_input_path(Path::new("uploads/model"), "model.ifc");
        assert_eq!(path, PathBuf::from("uploads/model/model.ifc"));
    }

    #[tokio::test]
    async fn test_ensure_layout_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("converted");
        let layout = StorageLayout::default();

        layout.ensure_layout(&root).await.expect("first call");
        layout.ensure_layout(&root).await.expect("second call");

        assert!(root.join("obj").is_dir());
        assert!(root.join("xml").is_dir());
        let entries = std::fs::read_dir(&root).expect("read_dir").count();
        assert_eq!(entries, 2);
    }

    #[tokio::test]
    async fn test_ensure_layout_reports_blocked_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("converted");
        std::fs::write(&blocker, b"not a directory").expect("write");

        let err = StorageLayout::default()
            .ensure_layout(&blocker)
            .await
            .expect_err("file in the way");
        assert!(matches!(err, ConversionError::DirectoryCreation { .. }));
    }
}
