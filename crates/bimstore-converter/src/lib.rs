//! # bimstore-converter
//!
//! Turns a stored IFC model into a mesh file and an XML metadata sidecar by
//! running an external converter executable twice, once per output kind.
//!
//! ## Output layout
//!
//! Every conversion writes into a single output root:
//!
//! ```text
//! <output_root>/<mesh_dir>/<stem>.<mesh_extension>
//! <output_root>/<metadata_dir>/<stem>.<metadata_extension>
//! ```
//!
//! where `<stem>` is the input filename without its extension. The same
//! filename always maps to the same two paths, so re-running a conversion
//! overwrites the previous outputs.
//!
//! ## Process runner
//!
//! The executable is reached through the [`ProcessRunner`] trait. Production
//! code uses [`TokioProcessRunner`]; tests substitute a fake runner.

pub mod error;
pub mod layout;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod runner;

pub use error::ConversionError;
pub use layout::StorageLayout;
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use models::{
    ConversionReport, ConversionResult, ConversionStage, ExitDetail, FailureReason, OutputKind,
    StoredFile,
};
pub use orchestrator::ConversionOrchestrator;
pub use runner::{DynProcessRunner, ProcessOutput, ProcessRunner, RunnerError, TokioProcessRunner};
