//! Model upload, listing, download and deletion handlers.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use bimstore_core::error::AppError;
use bimstore_storage::UploadedFile;

use crate::dto::response::{FileListResponse, MessageResponse, UploadResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /upload/ (multipart: `ifc_file`, `img_file`)
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut model: Option<UploadedFile> = None;
    let mut image: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "ifc_file" && name != "img_file" {
            continue;
        }

        let file_name = field
            .file_name()
            .map(String::from)
            .ok_or_else(|| AppError::validation(format!("{name} must be a file")))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Read error: {e}")))?;

        let file = UploadedFile::new(file_name, data);
        if name == "ifc_file" {
            model = Some(file);
        } else {
            image = Some(file);
        }
    }

    let model = model.ok_or_else(|| AppError::validation("ifc_file is required"))?;
    let image = image.ok_or_else(|| AppError::validation("img_file is required"))?;

    let saved = state.store.save_upload(model, image).await?;

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully!".to_string(),
        ifc_file: saved.model_path.to_string_lossy().into_owned(),
        img_file: saved.image_path.to_string_lossy().into_owned(),
    }))
}

/// GET /files/
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.store.list_models().await?;
    Ok(Json(FileListResponse { files }))
}

/// GET /download/{folder}
pub async fn download_folder(
    State(state): State<AppState>,
    Path(folder): Path<String>,
) -> Result<Response, ApiError> {
    let archive = state.store.archive_folder(&folder).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{folder}.zip\""),
            ),
        ],
        archive,
    )
        .into_response())
}

/// DELETE /delete/{filename}
pub async fn delete_model(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state.store.delete_model(&filename).await?;
    Ok(Json(MessageResponse {
        message: format!("File '{deleted}' deleted successfully."),
    }))
}
