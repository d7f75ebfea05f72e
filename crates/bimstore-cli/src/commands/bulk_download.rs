//! Download every model folder the server lists.

use bimstore_core::{AppError, AppResult};
use bimstore_storage::naming::model_folder;

use super::Context;
use super::download::download_folder;
use crate::output;

/// Execute the bulk-download command
pub async fn execute(ctx: &Context) -> AppResult<()> {
    let client = ctx.client()?;
    let files = client.list().await?;

    if files.is_empty() {
        output::print_warning("No files found on the server.");
        return Ok(());
    }

    let mut failed = Vec::new();
    for file in &files {
        let folder = model_folder(&file.filename);
        match download_folder(&client, &folder, &ctx.local_store).await {
            Ok(path) => output::print_success(&format!("{} -> {}", file.filename, path.display())),
            Err(e) => {
                output::print_error(&format!("{}: {}", file.filename, e.message));
                failed.push(file.filename.clone());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(AppError::external_service(format!(
            "{} of {} downloads failed: {}",
            failed.len(),
            files.len(),
            failed.join(", ")
        )))
    }
}
