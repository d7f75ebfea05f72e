//! Convert a model locally or ask the server to do it.

use std::path::{Path, PathBuf};

use clap::Args;

use bimstore_converter::{ConversionOrchestrator, ConversionResult, StoredFile};
use bimstore_core::{AppError, AppResult};
use bimstore_storage::naming::model_folder;

use super::Context;
use crate::output;

/// Arguments for the convert command
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Model file name, e.g. `tower.ifc`
    pub filename: String,

    /// Convert on the server instead of the local store
    #[arg(long)]
    pub remote: bool,

    /// Output root for local conversion
    #[arg(short, long, default_value = "converted")]
    pub output: PathBuf,
}

/// Execute the convert command
pub async fn execute(args: &ConvertArgs, ctx: &Context) -> AppResult<()> {
    if args.remote {
        let reply = ctx.client()?.convert(&args.filename).await?;
        output::print_success(&reply.message);
        output::print_item(
            &reply,
            ctx.format,
            &[("Mesh", reply.mesh_path.as_str()), ("Metadata", reply.metadata_path.as_str())],
        );
        return Ok(());
    }

    let config = ctx.load_config()?;
    let orchestrator = ConversionOrchestrator::from_config(config.converter);
    let stored = locate(&ctx.local_store, &args.filename);

    let result = orchestrator.convert_stored(&stored, &args.output).await;
    let report = result.to_report();
    match &result {
        ConversionResult::Success {
            mesh_path,
            metadata_path,
        } => {
            let (mesh, metadata) = (mesh_path.to_string_lossy(), metadata_path.to_string_lossy());
            output::print_success("File converted successfully!");
            output::print_item(
                &report,
                ctx.format,
                &[("Mesh", mesh.as_ref()), ("Metadata", metadata.as_ref())],
            );
            Ok(())
        }
        ConversionResult::Failure { reason } => {
            Err(AppError::internal(format!("Conversion failed: {}", reason.message())))
        }
    }
}

/// Downloads land in `<local_store>/<stem>/`; fall back to the store root
/// for files copied there by hand.
fn locate(local_store: &Path, filename: &str) -> StoredFile {
    let folder = local_store.join(model_folder(filename));
    if folder.join(filename).is_file() {
        StoredFile::new(folder, filename)
    } else {
        StoredFile::new(local_store, filename)
    }
}
