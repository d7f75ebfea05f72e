//! Conversion handler.

use std::path::PathBuf;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};

use bimstore_converter::ConversionResult;

use crate::dto::request::ConvertRequest;
use crate::dto::response::ConvertResponse;
use crate::error::{ApiError, ApiErrorResponse};
use crate::state::AppState;

/// POST /convert/ (form: `filename`)
///
/// Converts a stored model into `<converted_dir>/<mesh dir>` and
/// `<converted_dir>/<metadata dir>`. The request waits for both converter
/// runs to finish.
pub async fn convert(
    State(state): State<AppState>,
    Form(request): Form<ConvertRequest>,
) -> Result<Response, ApiError> {
    let stored = state.store.find_model(&request.filename).await?;
    let output_root = PathBuf::from(&state.config.storage.converted_dir);

    let response = match state.orchestrator.convert_stored(&stored, &output_root).await {
        ConversionResult::Success {
            mesh_path,
            metadata_path,
        } => Json(ConvertResponse {
            message: "File converted successfully!".to_string(),
            mesh_path: mesh_path.to_string_lossy().into_owned(),
            metadata_path: metadata_path.to_string_lossy().into_owned(),
        })
        .into_response(),
        ConversionResult::Failure { reason } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("CONVERSION_FAILED", reason.message())),
        )
            .into_response(),
    };

    Ok(response)
}
