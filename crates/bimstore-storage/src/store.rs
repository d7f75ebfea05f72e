//! Model store over the local filesystem.

use std::path::{Path, PathBuf};

use bimstore_converter::StoredFile;
use bimstore_core::config::StorageConfig;
use bimstore_core::error::{AppError, ErrorKind};
use bimstore_core::AppResult;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info};

use crate::archive;
use crate::models::{ModelEntry, SavedUpload, UploadedFile};
use crate::naming::{has_extension, model_folder, validate_name};

/// Stores uploaded model/image pairs, one folder per model.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
    model_extensions: Vec<String>,
    image_extensions: Vec<String>,
}

impl ModelStore {
    /// Open the store, creating the upload directory if needed.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let root = PathBuf::from(&config.upload_dir);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create upload directory: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            model_extensions: config.model_extensions.clone(),
            image_extensions: config.image_extensions.clone(),
        })
    }

    /// Upload directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Message returned when a model file has the wrong extension.
    pub fn model_extension_message(&self) -> String {
        format!("Only {} files are allowed", self.model_extensions.join(", "))
    }

    /// Message returned when a preview image has the wrong extension.
    pub fn image_extension_message(&self) -> String {
        format!(
            "Only image files ({}) are allowed",
            self.image_extensions.join(", ")
        )
    }

    /// Check both names before anything is written.
    pub fn validate_upload(&self, model_name: &str, image_name: &str) -> AppResult<()> {
        if !has_extension(model_name, &self.model_extensions) {
            return Err(AppError::validation(self.model_extension_message()));
        }
        if !has_extension(image_name, &self.image_extensions) {
            return Err(AppError::validation(self.image_extension_message()));
        }
        validate_name(model_name)?;
        validate_name(image_name)?;
        Ok(())
    }

    /// Write a model and its preview image into `<root>/<model stem>/`.
    ///
    /// An existing folder for the same stem is reused and same-named files
    /// are overwritten.
    pub async fn save_upload(
        &self,
        model: UploadedFile,
        image: UploadedFile,
    ) -> AppResult<SavedUpload> {
        self.validate_upload(&model.filename, &image.filename)?;

        let folder = self.root.join(model_folder(&model.filename));
        fs::create_dir_all(&folder).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create model folder: {}", folder.display()),
                e,
            )
        })?;

        let model_path = folder.join(&model.filename);
        let image_path = folder.join(&image.filename);
        write_file(&model_path, &model.data).await?;
        write_file(&image_path, &image.data).await?;

        info!(
            model = %model_path.display(),
            image = %image_path.display(),
            bytes = model.data.len() + image.data.len(),
            "Stored upload"
        );

        Ok(SavedUpload {
            model_path,
            image_path,
        })
    }

    /// Every stored model file, sorted by name.
    pub async fn list_models(&self) -> AppResult<Vec<ModelEntry>> {
        let mut entries = Vec::new();
        for file in self.scan_models().await? {
            let metadata = fs::metadata(file.path()).await?;
            let created = metadata.created().or_else(|_| metadata.modified())?;
            entries.push(ModelEntry {
                filename: file.filename,
                size: metadata.len(),
                created_at: DateTime::<Utc>::from(created),
            });
        }
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(entries)
    }

    /// Find a stored model by file name, ignoring case.
    pub async fn find_model(&self, filename: &str) -> AppResult<StoredFile> {
        validate_name(filename)?;
        self.scan_models()
            .await?
            .into_iter()
            .find(|f| f.filename.eq_ignore_ascii_case(filename))
            .ok_or_else(|| AppError::not_found(format!("Model '{filename}' not found")))
    }

    /// Delete a stored model, ignoring case. The model's folder goes with
    /// it; a top-level model file is removed on its own.
    ///
    /// Returns the stored name that was deleted.
    pub async fn delete_model(&self, filename: &str) -> AppResult<String> {
        let file = self.find_model(filename).await?;

        if file.input_root == self.root {
            fs::remove_file(file.path()).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete file: {}", file.filename),
                    e,
                )
            })?;
        } else {
            fs::remove_dir_all(&file.input_root).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete folder: {}", file.input_root.display()),
                    e,
                )
            })?;
        }

        info!(filename = %file.filename, "Deleted model");
        Ok(file.filename)
    }

    /// Zip `<root>/<folder>` in memory.
    pub async fn archive_folder(&self, folder: &str) -> AppResult<Bytes> {
        validate_name(folder)?;
        let path = self.root.join(folder);
        if !fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AppError::not_found("Folder not found"));
        }

        let bytes = tokio::task::spawn_blocking(move || archive::zip_folder(&path))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Archive task failed", e))??;

        debug!(folder, bytes = bytes.len(), "Built archive");
        Ok(Bytes::from(bytes))
    }

    /// Model files in model folders plus legacy top-level model files.
    async fn scan_models(&self) -> AppResult<Vec<StoredFile>> {
        let mut found = Vec::new();
        let mut top = fs::read_dir(&self.root).await?;
        while let Some(entry) = top.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                let mut inner = fs::read_dir(&path).await?;
                while let Some(child) = inner.next_entry().await? {
                    let child_name = child.file_name().to_string_lossy().into_owned();
                    if child.file_type().await?.is_file()
                        && has_extension(&child_name, &self.model_extensions)
                    {
                        found.push(StoredFile::new(&path, child_name));
                    }
                }
            } else if file_type.is_file() && has_extension(&name, &self.model_extensions) {
                found.push(StoredFile::new(&self.root, name));
            }
        }
        Ok(found)
    }
}

async fn write_file(path: &Path, data: &[u8]) -> AppResult<()> {
    fs::write(path, data).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write file: {}", path.display()),
            e,
        )
    })
}
