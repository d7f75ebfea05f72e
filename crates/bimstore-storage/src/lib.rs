//! # bimstore-storage
//!
//! Local filesystem storage for uploaded models. Each upload lands in its
//! own folder named after the model's stem:
//!
//! ```text
//! <upload_dir>/<stem>/<stem>.ifc
//! <upload_dir>/<stem>/<preview image>
//! ```
//!
//! Model files placed directly in `<upload_dir>` by older deployments are
//! still listed and can be deleted.

pub mod archive;
pub mod models;
pub mod naming;
pub mod store;

pub use models::{ModelEntry, SavedUpload, UploadedFile};
pub use store::ModelStore;
