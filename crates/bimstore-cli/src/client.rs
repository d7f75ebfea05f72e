//! HTTP client for the BIM Store server.

use std::path::Path;

use bimstore_core::AppResult;
use bimstore_core::error::{AppError, ErrorKind};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A model stored on the server.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct RemoteFile {
    /// File name.
    #[tabled(rename = "Filename")]
    pub filename: String,
    /// Size in bytes.
    #[tabled(rename = "Size (bytes)")]
    pub size: u64,
    /// Creation time.
    #[tabled(rename = "Created")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    files: Vec<RemoteFile>,
}

/// Server reply to an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReply {
    /// Confirmation text.
    pub message: String,
    /// Stored model path on the server.
    pub ifc_file: String,
    /// Stored image path on the server.
    pub img_file: String,
}

/// Server reply to a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertReply {
    /// Confirmation text.
    pub message: String,
    /// Mesh output path on the server.
    pub mesh_path: String,
    /// Metadata output path on the server.
    pub metadata_path: String,
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    message: String,
}

/// Client for one server base URL.
#[derive(Debug, Clone)]
pub struct ServerClient {
    base: Url,
    http: reqwest::Client,
}

impl ServerClient {
    /// Create a client for `base_url`, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::validation(format!("Invalid server URL '{base_url}': {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("bimstore-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { base, http })
    }

    /// URL for `segments` under the base, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::validation("Server URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Upload a model and its preview image.
    pub async fn upload(&self, model: &Path, image: &Path) -> AppResult<UploadReply> {
        let form = Form::new()
            .part("ifc_file", file_part(model).await?)
            .part("img_file", file_part(image).await?);

        let response = self
            .http
            .post(self.endpoint(&["upload", ""])?)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        decode(check(response).await?).await
    }

    /// Stored models.
    pub async fn list(&self) -> AppResult<Vec<RemoteFile>> {
        let response = self
            .http
            .get(self.endpoint(&["files", ""])?)
            .send()
            .await
            .map_err(transport)?;

        let list: FileList = decode(check(response).await?).await?;
        Ok(list.files)
    }

    /// Stream the zip of `folder` into `destination`. Returns bytes written.
    pub async fn download(&self, folder: &str, destination: &Path) -> AppResult<u64> {
        let response = self
            .http
            .get(self.endpoint(&["download", folder])?)
            .send()
            .await
            .map_err(transport)?;
        let response = check(response).await?;

        let mut file = tokio::fs::File::create(destination).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create {}", destination.display()),
                e,
            )
        })?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport)?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(folder, bytes = written, "Downloaded archive");
        Ok(written)
    }

    /// Ask the server to convert a stored model.
    pub async fn convert(&self, filename: &str) -> AppResult<ConvertReply> {
        let response = self
            .http
            .post(self.endpoint(&["convert", ""])?)
            .form(&[("filename", filename)])
            .send()
            .await
            .map_err(transport)?;

        decode(check(response).await?).await
    }

    /// Delete a stored model. Returns the server's confirmation.
    pub async fn delete(&self, filename: &str) -> AppResult<String> {
        let response = self
            .http
            .delete(self.endpoint(&["delete", filename])?)
            .send()
            .await
            .map_err(transport)?;

        let reply: MessageReply = decode(check(response).await?).await?;
        Ok(reply.message)
    }
}

async fn file_part(path: &Path) -> AppResult<Part> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::validation(format!("Invalid file path: {}", path.display())))?
        .to_string();

    let data = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("File '{}' not found", path.display()))
        } else {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {}", path.display()),
                e,
            )
        }
    })?;

    Part::bytes(data)
        .file_name(name)
        .mime_str("application/octet-stream")
        .map_err(|e| AppError::internal(format!("MIME parse error: {e}")))
}

fn transport(e: reqwest::Error) -> AppError {
    AppError::with_source(
        ErrorKind::ExternalService,
        format!("Request to server failed: {e}"),
        e,
    )
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> AppResult<T> {
    response.json::<T>().await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Serialization,
            format!("Unexpected server response: {e}"),
            e,
        )
    })
}

/// Turn a non-success response into an error carrying the server's message.
async fn check(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, &body))
}

/// Map a failed response to an [`AppError`] of the matching kind.
pub fn error_for_status(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("detail"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::validation(message),
        StatusCode::SERVICE_UNAVAILABLE => AppError::service_unavailable(message),
        other => AppError::external_service(format!("Server returned {other}: {message}")),
    }
}
