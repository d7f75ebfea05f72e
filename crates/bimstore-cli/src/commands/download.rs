//! Download a model folder and unpack it into the local store.

use std::path::{Path, PathBuf};

use clap::Args;

use bimstore_core::error::{AppError, ErrorKind};
use bimstore_core::AppResult;
use bimstore_storage::archive;

use super::Context;
use crate::client::ServerClient;
use crate::output;

/// Arguments for the download command
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Model folder name on the server (the model file name without `.ifc`)
    pub folder: String,
}

/// Execute the download command
pub async fn execute(args: &DownloadArgs, ctx: &Context) -> AppResult<()> {
    let client = ctx.client()?;
    let extracted = download_folder(&client, &args.folder, &ctx.local_store).await?;
    output::print_success(&format!("Files extracted to: {}", extracted.display()));
    Ok(())
}

/// Fetch `<folder>.zip` into `local_store`, extract it into
/// `<local_store>/<folder>` and remove the zip.
pub async fn download_folder(
    client: &ServerClient,
    folder: &str,
    local_store: &Path,
) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(local_store).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create local store {}", local_store.display()),
            e,
        )
    })?;

    let zip_path = local_store.join(format!("{folder}.zip"));
    let destination = local_store.join(folder);

    let bytes = match client.download(folder, &zip_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = tokio::fs::remove_file(&zip_path).await;
            return Err(e);
        }
    };
    tracing::debug!(zip = %zip_path.display(), bytes, "Archive saved");

    let (zip, dest) = (zip_path.clone(), destination.clone());
    let extracted = tokio::task::spawn_blocking(move || archive::extract_zip(&zip, &dest))
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Extraction task failed", e))?;

    if let Err(e) = tokio::fs::remove_file(&zip_path).await {
        output::print_warning(&format!(
            "Could not delete {}: {e}",
            zip_path.display()
        ));
    }

    let count = extracted?;
    tracing::debug!(files = count, "Archive extracted");
    Ok(destination)
}
