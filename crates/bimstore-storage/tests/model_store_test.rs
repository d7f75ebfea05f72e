use bimstore_core::config::StorageConfig;
use bimstore_core::error::ErrorKind;
use bimstore_storage::{ModelStore, UploadedFile};

async fn store_in(temp: &tempfile::TempDir) -> ModelStore {
    let config = StorageConfig {
        upload_dir: temp.path().join("uploads").to_string_lossy().into_owned(),
        ..Default::default()
    };
    ModelStore::new(&config).await.unwrap()
}

fn pair(model: &str, image: &str) -> (UploadedFile, UploadedFile) {
    (
        UploadedFile::new(model, &b"ISO-10303-21;"[..]),
        UploadedFile::new(image, &b"\x89PNG"[..]),
    )
}

#[tokio::test]
async fn test_save_upload_creates_model_folder() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;

    let (model, image) = pair("tower.ifc", "tower.png");
    let saved = store.save_upload(model, image).await.unwrap();

    assert_eq!(saved.model_path, store.root().join("tower").join("tower.ifc"));
    assert_eq!(saved.image_path, store.root().join("tower").join("tower.png"));
    assert!(saved.model_path.is_file());
    assert!(saved.image_path.is_file());
}

#[tokio::test]
async fn test_save_upload_rejects_wrong_extensions() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;

    let (model, image) = pair("tower.dwg", "tower.png");
    let err = store.save_upload(model, image).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Only .ifc files are allowed");

    let (model, image) = pair("tower.ifc", "tower.gif");
    let err = store.save_upload(model, image).await.unwrap_err();
    assert_eq!(err.message, "Only image files (.png, .jpg, .jpeg) are allowed");

    assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_save_upload_rejects_traversal() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;

    let (model, image) = pair("../escape.ifc", "plan.png");
    let err = store.save_upload(model, image).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(!temp.path().join("escape.ifc").exists());
}

#[tokio::test]
async fn test_list_models_includes_folders_and_legacy_files() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;

    let (model, image) = pair("tower.ifc", "tower.png");
    store.save_upload(model, image).await.unwrap();
    let (model, image) = pair("bridge.IFC", "bridge.jpg");
    store.save_upload(model, image).await.unwrap();
    std::fs::write(store.root().join("legacy.ifc"), b"old").unwrap();
    std::fs::write(store.root().join("notes.txt"), b"ignored").unwrap();

    let files = store.list_models().await.unwrap();
    let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["bridge.IFC", "legacy.ifc", "tower.ifc"]);

    let legacy = files.iter().find(|f| f.filename == "legacy.ifc").unwrap();
    assert_eq!(legacy.size, 3);

    let json = serde_json::to_value(&files[0]).unwrap();
    assert!(json["created_at"].is_string());
}

#[tokio::test]
async fn test_find_model_ignores_case() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;
    let (model, image) = pair("Tower.ifc", "tower.png");
    store.save_upload(model, image).await.unwrap();

    let found = store.find_model("tower.IFC").await.unwrap();
    assert_eq!(found.filename, "Tower.ifc");
    assert_eq!(found.input_root, store.root().join("Tower"));

    let err = store.find_model("missing.ifc").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_model_removes_folder() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;
    let (model, image) = pair("tower.ifc", "tower.png");
    store.save_upload(model, image).await.unwrap();

    let deleted = store.delete_model("TOWER.ifc").await.unwrap();
    assert_eq!(deleted, "tower.ifc");
    assert!(!store.root().join("tower").exists());
    assert!(store.list_models().await.unwrap().is_empty());

    let err = store.delete_model("tower.ifc").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_legacy_file_keeps_root() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;
    std::fs::write(store.root().join("legacy.ifc"), b"old").unwrap();

    store.delete_model("legacy.ifc").await.unwrap();
    assert!(store.root().is_dir());
    assert!(!store.root().join("legacy.ifc").exists());
}

#[tokio::test]
async fn test_delete_rejects_separators() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;
    let err = store.delete_model("..\\uploads").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_archive_folder() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(&temp).await;
    let (model, image) = pair("tower.ifc", "tower.png");
    store.save_upload(model, image).await.unwrap();

    let bytes = store.archive_folder("tower").await.unwrap();
    assert!(bytes.starts_with(b"PK"));

    let err = store.archive_folder("nope").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Folder not found");
}
