//! List models stored on the server.

use bimstore_core::AppResult;

use super::Context;
use crate::output;

/// Execute the list command
pub async fn execute(ctx: &Context) -> AppResult<()> {
    let files = ctx.client()?.list().await?;
    output::print_list(&files, ctx.format, "No files found on the server.");
    Ok(())
}
