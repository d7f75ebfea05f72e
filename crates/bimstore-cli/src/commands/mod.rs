//! CLI command definitions and dispatch.

pub mod bulk_download;
pub mod convert;
pub mod delete;
pub mod download;
pub mod list;
pub mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bimstore_core::AppResult;
use bimstore_core::config::AppConfig;

use crate::client::ServerClient;
use crate::output::OutputFormat;

/// BIM Store client: move IFC models and previews to and from a server
#[derive(Debug, Parser)]
#[command(name = "bimstore", version, about, long_about = None)]
pub struct Cli {
    /// Server base URL
    #[arg(short, long, global = true, default_value = "http://127.0.0.1:8000")]
    pub server: String,

    /// Directory receiving downloads and holding models for local conversion
    #[arg(short, long, global = true, default_value = "local store")]
    pub local_store: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to a configuration file (converter settings for local conversion)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a model and its preview image
    Upload(upload::UploadArgs),
    /// Download a model folder into the local store
    Download(download::DownloadArgs),
    /// List models stored on the server
    List,
    /// Convert a model to mesh and metadata outputs
    Convert(convert::ConvertArgs),
    /// Delete a model from the server
    Delete(delete::DeleteArgs),
    /// Download every model folder listed by the server
    BulkDownload,
}

/// Settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server base URL
    pub server: String,
    /// Local store directory
    pub local_store: PathBuf,
    /// Output format
    pub format: OutputFormat,
    /// Optional configuration file
    pub config: Option<String>,
}

impl Context {
    /// HTTP client for the configured server.
    pub fn client(&self) -> AppResult<ServerClient> {
        ServerClient::new(&self.server)
    }

    /// Configuration from `--config`, or the layered defaults.
    pub fn load_config(&self) -> AppResult<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load_file(path),
            None => {
                let env = std::env::var("BIMSTORE_ENV").unwrap_or_else(|_| "development".into());
                AppConfig::load(&env)
            }
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let ctx = Context {
            server: self.server.clone(),
            local_store: self.local_store.clone(),
            format: self.format,
            config: self.config.clone(),
        };

        match &self.command {
            Commands::Upload(args) => upload::execute(args, &ctx).await,
            Commands::Download(args) => download::execute(args, &ctx).await,
            Commands::List => list::execute(&ctx).await,
            Commands::Convert(args) => convert::execute(args, &ctx).await,
            Commands::Delete(args) => delete::execute(args, &ctx).await,
            Commands::BulkDownload => bulk_download::execute(&ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["bimstore", "list"]).unwrap();
        assert_eq!(cli.server, "http://127.0.0.1:8000");
        assert_eq!(cli.local_store, PathBuf::from("local store"));
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bimstore",
            "delete",
            "tower.ifc",
            "--yes",
            "--server",
            "http://10.0.0.5:9000",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.server, "http://10.0.0.5:9000");
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Delete(args) => {
                assert_eq!(args.filename, "tower.ifc");
                assert!(args.yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_convert_remote_flag() {
        let cli = Cli::try_parse_from(["bimstore", "convert", "tower.ifc", "--remote"]).unwrap();
        match cli.command {
            Commands::Convert(args) => assert!(args.remote),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
