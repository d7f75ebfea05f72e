//! Conversion orchestrator: turns one stored model into its mesh and
//! metadata outputs.
//!
//! A call runs strictly in order: ensure the output tree, resolve paths,
//! check the input, run the mesh invocation, then the metadata invocation.
//! The first failure ends the call. There is no retry and no timeout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bimstore_core::config::ConverterConfig;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ConversionError, truncate_output};
use crate::layout::StorageLayout;
use crate::metrics::{ConversionMetrics, MetricsSnapshot};
use crate::models::{ConversionResult, ConversionStage, OutputKind, StoredFile};
use crate::runner::{ProcessRunner, RunnerError, TokioProcessRunner};

/// Runs the external converter once per output kind and reports a
/// [`ConversionResult`].
#[derive(Debug)]
pub struct ConversionOrchestrator<R: ProcessRunner = TokioProcessRunner> {
    config: ConverterConfig,
    layout: StorageLayout,
    runner: Arc<R>,
    /// One lock per `<output_root>/<stem>` target currently in use.
    target_locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
    metrics: Arc<ConversionMetrics>,
}

impl<R: ProcessRunner> Clone for ConversionOrchestrator<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            layout: self.layout.clone(),
            runner: Arc::clone(&self.runner),
            target_locks: Arc::clone(&self.target_locks),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl ConversionOrchestrator<TokioProcessRunner> {
    /// Orchestrator that spawns real processes.
    pub fn from_config(config: ConverterConfig) -> Self {
        Self::new(config, TokioProcessRunner::new())
    }
}

impl<R: ProcessRunner> ConversionOrchestrator<R> {
    /// Create an orchestrator using `runner` to launch the converter.
    pub fn new(config: ConverterConfig, runner: R) -> Self {
        Self {
            layout: StorageLayout::from_config(&config),
            config,
            runner: Arc::new(runner),
            target_locks: Arc::new(DashMap::new()),
            metrics: Arc::new(ConversionMetrics::new()),
        }
    }

    /// Current metrics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Convert a file the storage layer already holds.
    pub async fn convert_stored(&self, file: &StoredFile, output_root: &Path) -> ConversionResult {
        self.convert(&file.input_root, output_root, &file.filename)
            .await
    }

    /// Convert `<input_root>/<filename>` into both outputs under `output_root`.
    ///
    /// Never returns an error: every failure is carried in
    /// [`ConversionResult::Failure`]. When the metadata step fails the mesh
    /// output already written stays in place.
    #[instrument(skip(self, input_root, output_root), fields(conversion_id))]
    pub async fn convert(
        &self,
        input_root: &Path,
        output_root: &Path,
        filename: &str,
    ) -> ConversionResult {
        let conversion_id = Uuid::now_v7();
        tracing::Span::current().record("conversion_id", conversion_id.to_string());

        let mut in_flight = InFlight::start(&self.metrics);
        let start = Instant::now();

        let lease = if self.config.serialize_same_target {
            let target = output_root.join(StorageLayout::stem(filename));
            Some(self.lock_target(target).await)
        } else {
            None
        };

        let outcome = self.run_pipeline(input_root, output_root, filename).await;
        drop(lease);
        in_flight.settled = true;

        match outcome {
            Ok((mesh_path, metadata_path)) => {
                let elapsed = start.elapsed();
                self.metrics.record_success(elapsed);
                info!(
                    mesh = %mesh_path.display(),
                    metadata = %metadata_path.display(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Conversion completed"
                );
                ConversionResult::Success {
                    mesh_path,
                    metadata_path,
                }
            }
            Err(err) => {
                warn!(error = %err, "Conversion failed");
                let reason = err.into();
                self.metrics.record_failure(&reason);
                ConversionResult::Failure { reason }
            }
        }
    }

    async fn run_pipeline(
        &self,
        input_root: &Path,
        output_root: &Path,
        filename: &str,
    ) -> Result<(PathBuf, PathBuf), ConversionError> {
        self.layout.ensure_layout(output_root).await?;

        let input_path = StorageLayout::resolve_input_path(input_root, filename);
        let mesh_path = self
            .layout
            .resolve_output_path(output_root, filename, OutputKind::Mesh);
        let metadata_path = self
            .layout
            .resolve_output_path(output_root, filename, OutputKind::Metadata);

        match tokio::fs::metadata(&input_path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ConversionError::InputNotFound { path: input_path }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConversionError::InputNotFound { path: input_path });
            }
            Err(source) => {
                return Err(ConversionError::InputUnreadable {
                    path: input_path,
                    source,
                });
            }
        }

        let mut stage = ConversionStage::NotStarted.start();
        for (kind, output_path) in [
            (OutputKind::Mesh, &mesh_path),
            (OutputKind::Metadata, &metadata_path),
        ] {
            debug!(?stage, output = %output_path.display(), "Running converter");
            let step = self.invoke(kind, &input_path, output_path).await;
            stage = stage.finish(step.is_ok());
            debug!(?stage, "Stage finished");
            step?;
        }

        Ok((mesh_path, metadata_path))
    }

    /// One converter run: `<executable> <input> <output> [mesh flags]`.
    async fn invoke(
        &self,
        kind: OutputKind,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), ConversionError> {
        let mut args = vec![
            input_path.to_string_lossy().into_owned(),
            output_path.to_string_lossy().into_owned(),
        ];
        if kind == OutputKind::Mesh {
            args.extend(self.config.mesh_flags.iter().cloned());
        }

        self.metrics.record_invocation();
        let output = self
            .runner
            .run(&self.config.executable, &args)
            .await
            .map_err(|e| match e {
                RunnerError::NotFound { .. } => ConversionError::ExecutableNotFound {
                    executable: self.config.executable.clone(),
                },
                RunnerError::Io { source, .. } => ConversionError::Spawn {
                    executable: self.config.executable.clone(),
                    source,
                },
            })?;

        if !output.success() {
            return Err(ConversionError::ProcessFailed {
                stage: kind,
                code: output.code,
                stderr: truncate_output(&output.stderr),
                stdout: truncate_output(&output.stdout),
            });
        }

        Ok(())
    }

    async fn lock_target(&self, target: PathBuf) -> TargetLease {
        let lock = self
            .target_locks
            .entry(target.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        TargetLease {
            guard: Some(guard),
            locks: Arc::clone(&self.target_locks),
            target,
        }
    }

    #[cfg(test)]
    fn tracked_targets(&self) -> usize {
        self.target_locks.len()
    }
}

/// Exclusive hold on one `<output_root>/<stem>` target.
///
/// Dropping it, on completion or when the call is cancelled, unlocks the
/// target and removes the map entry once no other call holds or waits on it.
struct TargetLease {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
    target: PathBuf,
}

impl Drop for TargetLease {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.target, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Counts a started call and, unless it is settled, records it as cancelled
/// when dropped.
struct InFlight<'a> {
    metrics: &'a ConversionMetrics,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn start(metrics: &'a ConversionMetrics) -> Self {
        metrics.record_started();
        Self {
            metrics,
            settled: false,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.metrics.record_cancelled();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureReason;
    use crate::runner::ProcessOutput;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// Writes the output file named by the second argument and returns the
    /// scripted exit codes in order.
    #[derive(Debug, Default)]
    struct ScriptedRunner {
        codes: StdMutex<Vec<i32>>,
        calls: StdMutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn with_codes(codes: &[i32]) -> Self {
            Self {
                codes: StdMutex::new(codes.iter().rev().copied().collect()),
                calls: StdMutex::default(),
            }
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, _program: &str, args: &[String]) -> Result<ProcessOutput, RunnerError> {
            self.calls.lock().unwrap().push(args.to_vec());
            let code = self.codes.lock().unwrap().pop().unwrap_or(0);
            if code == 0 {
                std::fs::write(&args[1], b"converted").unwrap();
            }
            Ok(ProcessOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: if code == 0 { String::new() } else { "failed".to_string() },
            })
        }
    }

    /// Hangs on its first run until dropped; later runs succeed.
    #[derive(Debug, Default)]
    struct StallingRunner {
        entered: Notify,
        stalled: AtomicBool,
    }

    #[async_trait]
    impl ProcessRunner for StallingRunner {
        async fn run(&self, _program: &str, args: &[String]) -> Result<ProcessOutput, RunnerError> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                self.entered.notify_one();
                std::future::pending::<()>().await;
            }
            std::fs::write(&args[1], b"converted").unwrap();
            Ok(ProcessOutput::exited(0))
        }
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let input_root = temp.path().join("uploads").join("tower");
        std::fs::create_dir_all(&input_root).unwrap();
        std::fs::write(input_root.join("tower.ifc"), b"ISO-10303-21;").unwrap();
        let output_root = temp.path().join("converted");
        (temp, input_root, output_root)
    }

    #[tokio::test]
    async fn test_lock_entries_are_pruned() {
        let (_temp, input_root, output_root) = setup();
        let orchestrator =
            ConversionOrchestrator::new(ConverterConfig::default(), ScriptedRunner::default());

        let result = orchestrator
            .convert(&input_root, &output_root, "tower.ifc")
            .await;
        assert!(result.is_success());
        assert_eq!(orchestrator.tracked_targets(), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_records_stage_metric() {
        let (_temp, input_root, output_root) = setup();
        let runner = ScriptedRunner::with_codes(&[0, 2]);
        let orchestrator = ConversionOrchestrator::new(ConverterConfig::default(), runner);

        let result = orchestrator
            .convert(&input_root, &output_root, "tower.ifc")
            .await;
        assert_eq!(
            result.failure_reason().and_then(FailureReason::failed_stage),
            Some(OutputKind::Metadata)
        );

        let snap = orchestrator.metrics_snapshot();
        assert_eq!(snap.conversions_started, 1);
        assert_eq!(snap.metadata_step_failures, 1);
        assert_eq!(snap.process_invocations, 2);
    }

    #[tokio::test]
    async fn test_missing_input_spawns_nothing() {
        let (_temp, input_root, output_root) = setup();
        let runner = ScriptedRunner::default();
        let orchestrator = ConversionOrchestrator::new(ConverterConfig::default(), runner);

        let result = orchestrator
            .convert(&input_root, &output_root, "absent.ifc")
            .await;
        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::InputNotFound { .. })
        ));
        assert!(orchestrator.runner.calls.lock().unwrap().is_empty());
        // Layout is created before the input check.
        assert!(output_root.join("obj").is_dir());
    }

    #[tokio::test]
    async fn test_convert_stored_uses_file_root() {
        let (_temp, input_root, output_root) = setup();
        let orchestrator =
            ConversionOrchestrator::new(ConverterConfig::default(), ScriptedRunner::default());
        let stored = StoredFile::new(&input_root, "tower.ifc");

        let result = orchestrator.convert_stored(&stored, &output_root).await;
        assert!(result.is_success());

        let calls = orchestrator.runner.calls.lock().unwrap();
        assert_eq!(calls[0][0], stored.path().to_string_lossy());
    }

    #[tokio::test]
    async fn test_cancelled_call_releases_target() {
        let (_temp, input_root, output_root) = setup();
        let orchestrator =
            ConversionOrchestrator::new(ConverterConfig::default(), StallingRunner::default());

        let task = {
            let orchestrator = orchestrator.clone();
            let (input_root, output_root) = (input_root.clone(), output_root.clone());
            tokio::spawn(async move {
                orchestrator
                    .convert(&input_root, &output_root, "tower.ifc")
                    .await
            })
        };
        orchestrator.runner.entered.notified().await;
        assert_eq!(orchestrator.tracked_targets(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(orchestrator.tracked_targets(), 0);

        let snap = orchestrator.metrics_snapshot();
        assert_eq!(snap.conversions_started, 1);
        assert_eq!(snap.conversions_cancelled, 1);
        assert_eq!(snap.conversions_failed, 0);

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            orchestrator.convert(&input_root, &output_root, "tower.ifc"),
        )
        .await
        .expect("target was left locked");
        assert!(result.is_success());
        assert_eq!(orchestrator.tracked_targets(), 0);
    }

    #[tokio::test]
    async fn test_directory_input_is_not_found() {
        let (_temp, input_root, output_root) = setup();
        let orchestrator =
            ConversionOrchestrator::new(ConverterConfig::default(), ScriptedRunner::default());

        let result = orchestrator.convert(&input_root, &output_root, "").await;
        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::InputNotFound { .. })
        ));
        assert!(orchestrator.runner.calls.lock().unwrap().is_empty());
    }
}
