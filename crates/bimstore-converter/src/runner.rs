//! Process runner abstraction over the external converter.
//!
//! The orchestrator never spawns processes directly; it asks a
//! [`ProcessRunner`] to run a program with arguments and inspects the
//! returned [`ProcessOutput`].

use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from launching a process.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The program does not exist or is not executable.
    #[error("Program not found or not executable: {program}")]
    NotFound {
        /// Program that was requested.
        program: String,
    },

    /// The process could not be started or awaited.
    #[error("Failed to run '{program}': {source}")]
    Io {
        /// Program that was requested.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Completed process status and captured output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Output of a process that exited with `code` and printed nothing.
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }

    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync + std::fmt::Debug + 'static {
    /// Run `program` with `args`, wait for it to exit and return its status.
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, RunnerError>;
}

#[async_trait]
impl<R: ProcessRunner + ?Sized> ProcessRunner for Arc<R> {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, RunnerError> {
        (**self).run(program, args).await
    }
}

/// Type-erased runner shared by long-lived services.
pub type DynProcessRunner = Arc<dyn ProcessRunner>;

/// [`ProcessRunner`] backed by `tokio::process`.
///
/// The child is awaited to natural completion; there is no timeout. If the
/// calling future is dropped first, the child is killed.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Create a runner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput, RunnerError> {
        let mut cmd = Command::new(program);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd.args(args)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(program, ?args, "Spawning process");
        let start = Instant::now();

        let output = cmd.output().await.map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                RunnerError::NotFound {
                    program: program.to_string(),
                }
            }
            _ => RunnerError::Io {
                program: program.to_string(),
                source,
            },
        })?;

        debug!(
            program,
            code = ?output.status.code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Process exited"
        );

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
