//! BIM Store server
//!
//! Main entry point that wires the storage, converter, sensor feed and HTTP
//! layers together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use bimstore_converter::{ConversionOrchestrator, DynProcessRunner, TokioProcessRunner};
use bimstore_core::config::AppConfig;
use bimstore_core::error::AppError;
use bimstore_storage::ModelStore;
use bimstore_worker::SensorFeed;

#[tokio::main]
async fn main() {
    let env = std::env::var("BIMSTORE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Configuration loaded (env: {})", env);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting BIM Store v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Data directories ─────────────────────────────────
    create_data_directories(&config).await?;
    let store = ModelStore::new(&config.storage).await?;

    // ── Step 2: Converter ────────────────────────────────────────
    tracing::info!(
        executable = %config.converter.executable,
        "Converter configured"
    );
    let runner: DynProcessRunner = Arc::new(TokioProcessRunner::new());
    let orchestrator = ConversionOrchestrator::new(config.converter.clone(), runner);

    // ── Step 3: Sensor feed ──────────────────────────────────────
    let feed = SensorFeed::new(config.sensor.clone());
    let reading = feed.reading();
    let sensor_handle = if config.sensor.enabled {
        Some(feed.start())
    } else {
        tracing::info!("Sensor feed disabled");
        None
    };

    // ── Step 4: HTTP server ──────────────────────────────────────
    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = bimstore_api::AppState::new(config, store, orchestrator, reading);
    let app = bimstore_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("BIM Store server listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(handle) = sensor_handle {
        if tokio::time::timeout(grace, handle.shutdown()).await.is_err() {
            tracing::warn!("Sensor feed did not stop within {:?}", grace);
        }
    }

    tracing::info!("BIM Store server shut down gracefully");
    Ok(())
}

/// Create the upload and conversion output directories
async fn create_data_directories(config: &AppConfig) -> Result<(), AppError> {
    for dir in [&config.storage.upload_dir, &config.storage.converted_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create dir '{}': {}", dir, e)))?;
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
