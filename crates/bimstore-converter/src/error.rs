//! Error type for the conversion pipeline.
//!
//! `ConversionError` is the internal error of each pipeline step. At the
//! orchestrator boundary it is folded into a [`FailureReason`] so callers
//! always receive a [`ConversionResult`](crate::models::ConversionResult)
//! rather than an `Err`.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{ExitDetail, FailureReason, OutputKind};

/// Maximum number of characters of captured process output kept in errors.
pub(crate) const MAX_CAPTURED_CHARS: usize = 2000;

/// Errors raised while converting a stored model.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Output directory tree could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The stored input file does not exist.
    #[error("Input file not found: {path}")]
    InputNotFound {
        /// Expected input path.
        path: PathBuf,
    },

    /// The input path could not be inspected.
    #[error("Failed to read input file {path}: {source}")]
    InputUnreadable {
        /// Input path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// Converter executable is missing or not executable.
    #[error("Converter executable not found: {executable}")]
    ExecutableNotFound {
        /// Configured executable.
        executable: String,
    },

    /// Converter could not be started or awaited for a reason other than a
    /// missing binary.
    #[error("Failed to run converter '{executable}': {source}")]
    Spawn {
        /// Configured executable.
        executable: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Converter ran but signalled failure.
    #[error("{stage} conversion exited with {}: {stderr}", describe_code(.code))]
    ProcessFailed {
        /// Which invocation failed.
        stage: OutputKind,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured stderr (truncated).
        stderr: String,
        /// Captured stdout (truncated).
        stdout: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<ConversionError> for FailureReason {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::DirectoryCreation { path, source } => {
                FailureReason::DirectoryCreation {
                    path,
                    detail: source.to_string(),
                }
            }
            ConversionError::InputNotFound { path } => FailureReason::InputNotFound { path },
            ConversionError::InputUnreadable { path, source } => FailureReason::InputUnreadable {
                path,
                detail: source.to_string(),
            },
            ConversionError::ExecutableNotFound { executable } => {
                FailureReason::ExecutableNotFound { executable }
            }
            ConversionError::Spawn { executable, source } => FailureReason::LaunchFailed {
                executable,
                detail: source.to_string(),
            },
            ConversionError::ProcessFailed {
                stage,
                code,
                stderr,
                stdout,
            } => FailureReason::ProcessExitedNonZero(ExitDetail {
                stage,
                code,
                stderr,
                stdout,
            }),
        }
    }
}

/// Keep at most [`MAX_CAPTURED_CHARS`] characters of process output.
pub(crate) fn truncate_output(text: &str) -> String {
    text.trim().chars().take(MAX_CAPTURED_CHARS).collect()
}
