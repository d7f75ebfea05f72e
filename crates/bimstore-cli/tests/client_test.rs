//! Client tests against a real server bound to an ephemeral port.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use bimstore_api::{AppState, build_app};
use bimstore_cli::ServerClient;
use bimstore_cli::commands::download::download_folder;
use bimstore_converter::{
    ConversionOrchestrator, DynProcessRunner, ProcessOutput, ProcessRunner, RunnerError,
};
use bimstore_core::config::AppConfig;
use bimstore_core::error::ErrorKind;
use bimstore_storage::ModelStore;
use bimstore_worker::SensorReading;

#[derive(Debug)]
struct WritingRunner;

#[async_trait]
impl ProcessRunner for WritingRunner {
    async fn run(&self, _program: &str, args: &[String]) -> Result<ProcessOutput, RunnerError> {
        std::fs::write(&args[1], b"converted").unwrap();
        Ok(ProcessOutput::exited(0))
    }
}

struct Server {
    _temp: tempfile::TempDir,
    client: ServerClient,
    converted_dir: std::path::PathBuf,
}

async fn spawn_server() -> Server {
    let temp = tempfile::tempdir().unwrap();
    let converted_dir = temp.path().join("converted");

    let mut config = AppConfig::default();
    config.storage.upload_dir = temp.path().join("uploads").to_string_lossy().into_owned();
    config.storage.converted_dir = converted_dir.to_string_lossy().into_owned();

    let store = ModelStore::new(&config.storage).await.unwrap();
    let runner: DynProcessRunner = Arc::new(WritingRunner);
    let orchestrator = ConversionOrchestrator::new(config.converter.clone(), runner);
    let sensor = Arc::new(RwLock::new(SensorReading {
        name: "DummyData".to_string(),
        value: 7,
        timestamp: "2026-01-01T00:00:00+00:00".to_string(),
    }));
    let app = build_app(AppState::new(config, store, orchestrator, sensor));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Server {
        _temp: temp,
        client: ServerClient::new(&format!("http://{addr}")).unwrap(),
        converted_dir,
    }
}

fn write_local(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[tokio::test]
async fn test_upload_list_download_delete() {
    let server = spawn_server().await;
    let local = tempfile::tempdir().unwrap();
    let model = write_local(local.path(), "Tower Block.ifc", b"ISO-10303-21;");
    let image = write_local(local.path(), "Tower Block.png", b"\x89PNG");

    let reply = server.client.upload(&model, &image).await.unwrap();
    assert_eq!(reply.message, "Files uploaded successfully!");

    let files = server.client.list().await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "Tower Block.ifc");
    assert_eq!(files[0].size, 13);

    let store = local.path().join("local store");
    let extracted = download_folder(&server.client, "Tower Block", &store)
        .await
        .unwrap();
    assert_eq!(extracted, store.join("Tower Block"));
    assert_eq!(
        std::fs::read(extracted.join("Tower Block.ifc")).unwrap(),
        b"ISO-10303-21;"
    );
    assert!(extracted.join("Tower Block.png").is_file());
    assert!(!store.join("Tower Block.zip").exists());

    let message = server.client.delete("tower block.IFC").await.unwrap();
    assert_eq!(message, "File 'Tower Block.ifc' deleted successfully.");
    assert!(server.client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_convert() {
    let server = spawn_server().await;
    let local = tempfile::tempdir().unwrap();
    let model = write_local(local.path(), "tower.ifc", b"ISO-10303-21;");
    let image = write_local(local.path(), "tower.jpg", b"\xff\xd8");
    server.client.upload(&model, &image).await.unwrap();

    let reply = server.client.convert("tower.ifc").await.unwrap();
    assert_eq!(reply.message, "File converted successfully!");
    assert!(reply.mesh_path.ends_with("tower.obj"));
    assert!(server.converted_dir.join("xml").join("tower.xml").is_file());

    let err = server.client.convert("ghost.ifc").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_remote_convert_reserved_characters() {
    let server = spawn_server().await;
    let local = tempfile::tempdir().unwrap();
    let model = write_local(local.path(), "Tower & Co+1.ifc", b"ISO-10303-21;");
    let image = write_local(local.path(), "Tower & Co+1.png", b"\x89PNG");
    server.client.upload(&model, &image).await.unwrap();

    let reply = server.client.convert("Tower & Co+1.ifc").await.unwrap();
    assert!(reply.mesh_path.ends_with("Tower & Co+1.obj"));
    assert!(
        server
            .converted_dir
            .join("xml")
            .join("Tower & Co+1.xml")
            .is_file()
    );
}

#[tokio::test]
async fn test_errors_carry_server_message() {
    let server = spawn_server().await;
    let local = tempfile::tempdir().unwrap();

    let err = server.client.delete("ghost.ifc").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = download_folder(&server.client, "ghost", local.path())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Folder not found");
    assert!(!local.path().join("ghost.zip").exists());

    let model = write_local(local.path(), "plan.dwg", b"AC1032");
    let image = write_local(local.path(), "plan.png", b"\x89PNG");
    let err = server.client.upload(&model, &image).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Only .ifc files are allowed");
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ServerClient::new(&format!("http://{addr}")).unwrap();
    let err = client.list().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExternalService);
}
