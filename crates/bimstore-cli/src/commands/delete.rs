//! Delete a model from the server.

use clap::Args;

use bimstore_core::error::{AppError, ErrorKind};
use bimstore_core::AppResult;

use super::Context;
use crate::output;

/// Arguments for the delete command
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Model file name, matched case-insensitively
    pub filename: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the delete command
pub async fn execute(args: &DeleteArgs, ctx: &Context) -> AppResult<()> {
    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete '{}' and its folder from the server?",
                args.filename
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

        if !confirm {
            println!("Aborted.");
            return Ok(());
        }
    }

    match ctx.client()?.delete(&args.filename).await {
        Ok(message) => {
            output::print_success(&message);
            Ok(())
        }
        Err(e) if e.kind == ErrorKind::NotFound => Err(AppError::not_found(format!(
            "File '{}' not found on the server.",
            args.filename
        ))),
        Err(e) if e.kind == ErrorKind::Validation => Err(AppError::validation(format!(
            "Invalid file name '{}': {}",
            args.filename, e.message
        ))),
        Err(e) => Err(e),
    }
}
