//! Domain models: output kinds, stored inputs, conversion outcomes and the
//! per-call stage machine.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OutputKind
// ---------------------------------------------------------------------------

/// The two derived representations produced for every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// 3-D geometry output.
    Mesh,
    /// XML metadata sidecar.
    Metadata,
}

impl OutputKind {
    /// Lowercase name used in logs and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Mesh => "mesh",
            OutputKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StoredFile
// ---------------------------------------------------------------------------

/// A model file previously written by the storage layer.
///
/// The converter only reads it; deletion belongs to the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// File name including its extension, e.g. `tower.ifc`.
    pub filename: String,
    /// Directory that contains the file.
    pub input_root: PathBuf,
}

impl StoredFile {
    /// Create a stored-file reference.
    pub fn new(input_root: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            input_root: input_root.into(),
        }
    }

    /// Full path of the stored file.
    pub fn path(&self) -> PathBuf {
        self.input_root.join(&self.filename)
    }
}

// ---------------------------------------------------------------------------
// ConversionResult
// ---------------------------------------------------------------------------

/// Exit information for a converter invocation that signalled failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitDetail {
    /// Invocation that failed.
    pub stage: OutputKind,
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stderr (truncated).
    pub stderr: String,
    /// Captured stdout (truncated).
    pub stdout: String,
}

/// Why a conversion did not produce both outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The output tree could not be created; nothing was attempted.
    DirectoryCreation {
        /// Directory that failed.
        path: PathBuf,
        /// Filesystem error text.
        detail: String,
    },
    /// The stored input file was not present, or is not a regular file.
    InputNotFound {
        /// Expected input path.
        path: PathBuf,
    },
    /// The input path exists but could not be inspected.
    InputUnreadable {
        /// Input path.
        path: PathBuf,
        /// Filesystem error text.
        detail: String,
    },
    /// The converter executable could not be located.
    ExecutableNotFound {
        /// Configured executable.
        executable: String,
    },
    /// The converter was found but could not be run to completion.
    LaunchFailed {
        /// Configured executable.
        executable: String,
        /// OS error text.
        detail: String,
    },
    /// One of the two invocations exited non-zero.
    ProcessExitedNonZero(ExitDetail),
}

impl FailureReason {
    /// Human-readable diagnostic returned to clients.
    pub fn message(&self) -> String {
        match self {
            FailureReason::DirectoryCreation { path, detail } => format!(
                "Could not create output directory '{}': {}",
                path.display(),
                detail
            ),
            FailureReason::InputNotFound { path } => {
                format!("Input file not found: {}", path.display())
            }
            FailureReason::InputUnreadable { path, detail } => {
                format!("Could not read input file '{}': {}", path.display(), detail)
            }
            FailureReason::ExecutableNotFound { .. } => {
                "IFC converter executable not found.".to_string()
            }
            FailureReason::LaunchFailed { executable, detail } => {
                format!("Failed to run IFC converter '{executable}': {detail}")
            }
            FailureReason::ProcessExitedNonZero(detail) => {
                let code = match detail.code {
                    Some(c) => format!("exit code {c}"),
                    None => "termination by signal".to_string(),
                };
                // IfcConvert reports some errors on stdout only.
                let diagnostic = if detail.stderr.is_empty() {
                    &detail.stdout
                } else {
                    &detail.stderr
                };
                if diagnostic.is_empty() {
                    format!("Conversion failed: {} step ended with {}", detail.stage, code)
                } else {
                    format!(
                        "Conversion failed: {} step ended with {}: {}",
                        detail.stage, code, diagnostic
                    )
                }
            }
        }
    }

    /// Stage that failed, when the failure came from a converter run.
    pub fn failed_stage(&self) -> Option<OutputKind> {
        match self {
            FailureReason::ProcessExitedNonZero(detail) => Some(detail.stage),
            _ => None,
        }
    }
}

/// Outcome of one `convert` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    /// Both outputs were written.
    Success {
        /// Path of the mesh output.
        mesh_path: PathBuf,
        /// Path of the metadata sidecar.
        metadata_path: PathBuf,
    },
    /// The conversion stopped early.
    ///
    /// When the metadata step is the one that failed, the mesh output of the
    /// same call stays on disk.
    Failure {
        /// Why it stopped.
        reason: FailureReason,
    },
}

impl ConversionResult {
    /// Whether both outputs were produced.
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }

    /// The failure reason, if any.
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            ConversionResult::Failure { reason } => Some(reason),
            ConversionResult::Success { .. } => None,
        }
    }

    /// Flatten into the wire contract returned to HTTP and CLI callers.
    pub fn to_report(&self) -> ConversionReport {
        match self {
            ConversionResult::Success {
                mesh_path,
                metadata_path,
            } => ConversionReport {
                status: "success".to_string(),
                mesh_path: Some(path_string(mesh_path)),
                metadata_path: Some(path_string(metadata_path)),
                message: None,
            },
            ConversionResult::Failure { reason } => ConversionReport {
                status: "failure".to_string(),
                mesh_path: None,
                metadata_path: None,
                message: Some(reason.message()),
            },
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Serializable result contract: `status` plus either both paths or a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// `"success"` or `"failure"`.
    pub status: String,
    /// Mesh output path on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_path: Option<String>,
    /// Metadata output path on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<String>,
    /// Diagnostic on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// ConversionStage
// ---------------------------------------------------------------------------

/// Progress of a single conversion call.
///
/// ```text
/// NotStarted -> MeshConversionRunning -> MeshFailed
///                                     -> MetadataConversionRunning -> MetadataFailed
///                                                                  -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStage {
    /// Nothing has been spawned yet.
    NotStarted,
    /// The mesh invocation is running.
    MeshConversionRunning,
    /// The mesh invocation failed (terminal).
    MeshFailed,
    /// The metadata invocation is running.
    MetadataConversionRunning,
    /// The metadata invocation failed (terminal).
    MetadataFailed,
    /// Both outputs were written (terminal).
    Done,
}

impl ConversionStage {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionStage::MeshFailed | ConversionStage::MetadataFailed | ConversionStage::Done
        )
    }

    /// Transition out of `NotStarted`.
    pub fn start(self) -> Self {
        match self {
            ConversionStage::NotStarted => ConversionStage::MeshConversionRunning,
            other => other,
        }
    }

    /// Transition out of a running stage given the invocation's outcome.
    /// Terminal and not-started stages are returned unchanged.
    pub fn finish(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (ConversionStage::MeshConversionRunning, true) => {
                ConversionStage::MetadataConversionRunning
            }
            (ConversionStage::MeshConversionRunning, false) => ConversionStage::MeshFailed,
            (ConversionStage::MetadataConversionRunning, true) => ConversionStage::Done,
            (ConversionStage::MetadataConversionRunning, false) => ConversionStage::MetadataFailed,
            (other, _) => other,
        }
    }

    /// Output kind being produced while in a running stage.
    pub fn running_kind(&self) -> Option<OutputKind> {
        match self {
            ConversionStage::MeshConversionRunning => Some(OutputKind::Mesh),
            ConversionStage::MetadataConversionRunning => Some(OutputKind::Metadata),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_happy_path() {
        let stage = ConversionStage::NotStarted.start();
        assert_eq!(stage.running_kind(), Some(OutputKind::Mesh));
        let stage = stage.finish(true);
        assert_eq!(stage, ConversionStage::MetadataConversionRunning);
        let stage = stage.finish(true);
        assert_eq!(stage, ConversionStage::Done);
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_stage_terminal_states_do_not_move() {
        for terminal in [
            ConversionStage::MeshFailed,
            ConversionStage::MetadataFailed,
            ConversionStage::Done,
        ] {
            assert_eq!(terminal.start(), terminal);
            assert_eq!(terminal.finish(true), terminal);
            assert_eq!(terminal.finish(false), terminal);
        }
    }

    #[test]
    fn test_stage_failures() {
        assert_eq!(
            ConversionStage::MeshConversionRunning.finish(false),
            ConversionStage::MeshFailed
        );
        assert_eq!(
            ConversionStage::MetadataConversionRunning.finish(false),
            ConversionStage::MetadataFailed
        );
    }

    #[test]
    fn test_success_report_shape() {
        let result = ConversionResult::Success {
            mesh_path: PathBuf::from("converted/obj/tower.obj"),
            metadata_path: PathBuf::from("converted/xml/tower.xml"),
        };
        let json = serde_json::to_value(result.to_report()).expect("serialize");
        assert_eq!(json["status"], "success");
        assert_eq!(json["mesh_path"], "converted/obj/tower.obj");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_failure_report_uses_fixed_not_found_message() {
        let result = ConversionResult::Failure {
            reason: FailureReason::ExecutableNotFound {
                executable: "IfcConvert".to_string(),
            },
        };
        let report = result.to_report();
        assert_eq!(report.status, "failure");
        assert_eq!(
            report.message.as_deref(),
            Some("IFC converter executable not found.")
        );
        assert!(report.mesh_path.is_none());
    }

    #[test]
    fn test_exit_detail_message_includes_stage_and_code() {
        let reason = FailureReason::ProcessExitedNonZero(ExitDetail {
            stage: OutputKind::Metadata,
            code: Some(1),
            stderr: "Unsupported schema".to_string(),
            stdout: String::new(),
        });
        assert_eq!(reason.failed_stage(), Some(OutputKind::Metadata));
        assert_eq!(
            reason.message(),
            "Conversion failed: metadata step ended with exit code 1: Unsupported schema"
        );
    }

    #[test]
    fn test_exit_detail_message_falls_back_to_stdout() {
        let reason = FailureReason::ProcessExitedNonZero(ExitDetail {
            stage: OutputKind::Mesh,
            code: Some(1),
            stderr: String::new(),
            stdout: "[Error] Failed to parse file".to_string(),
        });
        assert_eq!(
            reason.message(),
            "Conversion failed: mesh step ended with exit code 1: [Error] Failed to parse file"
        );

        let silent = FailureReason::ProcessExitedNonZero(ExitDetail {
            stage: OutputKind::Mesh,
            code: None,
            stderr: String::new(),
            stdout: String::new(),
        });
        assert_eq!(
            silent.message(),
            "Conversion failed: mesh step ended with termination by signal"
        );
    }

    #[test]
    fn test_launch_failure_keeps_os_detail() {
        let reason = FailureReason::LaunchFailed {
            executable: "IfcConvert".to_string(),
            detail: "Exec format error (os error 8)".to_string(),
        };
        assert_eq!(
            reason.message(),
            "Failed to run IFC converter 'IfcConvert': Exec format error (os error 8)"
        );
        assert_eq!(reason.failed_stage(), None);
    }
}
