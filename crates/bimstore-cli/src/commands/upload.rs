//! Upload a model and its preview image.

use std::path::PathBuf;

use clap::Args;

use bimstore_core::{AppError, AppResult};

use super::Context;
use crate::output;

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// IFC model file
    pub model: PathBuf,

    /// Preview image (.png, .jpg, .jpeg)
    pub image: PathBuf,
}

/// Execute the upload command
pub async fn execute(args: &UploadArgs, ctx: &Context) -> AppResult<()> {
    for path in [&args.model, &args.image] {
        if !path.is_file() {
            return Err(AppError::not_found(format!(
                "File '{}' not found. Please check the filename.",
                path.display()
            )));
        }
    }

    let reply = ctx.client()?.upload(&args.model, &args.image).await?;

    output::print_success(&reply.message);
    output::print_item(
        &reply,
        ctx.format,
        &[("Model", reply.ifc_file.as_str()), ("Image", reply.img_file.as_str())],
    );
    Ok(())
}
