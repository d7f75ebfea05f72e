//! Zip packaging of model folders and extraction on the client side.
//!
//! Both directions are blocking and meant to run under
//! `tokio::task::spawn_blocking`.

use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use bimstore_core::error::{AppError, ErrorKind};
use bimstore_core::AppResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Maximum number of entries accepted when extracting.
pub const MAX_ZIP_ENTRIES: usize = 10_000;
/// Maximum total uncompressed size accepted when extracting (4 GB).
pub const MAX_EXTRACTED_SIZE: u64 = 4 * 1024 * 1024 * 1024;

const BUFFER_SIZE: usize = 64 * 1024;

fn zip_error(context: &str, e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, context.to_string(), e)
}

/// Zip the contents of `folder` in memory. Entry names are relative to
/// `folder`, so extracting the archive recreates the folder's contents.
pub fn zip_folder(folder: &Path) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut pending = vec![folder.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        for path in entries {
            let relative = path
                .strip_prefix(folder)
                .map_err(|_| AppError::internal("Archive entry outside folder"))?
                .to_string_lossy()
                .replace('\\', "/");

            if path.is_dir() {
                writer
                    .add_directory(format!("{relative}/"), options)
                    .map_err(|e| zip_error("Failed to add directory to archive", e))?;
                pending.push(path);
            } else {
                writer
                    .start_file(relative, options)
                    .map_err(|e| zip_error("Failed to add file to archive", e))?;
                let mut file = File::open(&path)?;
                let mut buffer = vec![0u8; BUFFER_SIZE];
                loop {
                    let n = file.read(&mut buffer)?;
                    if n == 0 {
                        break;
                    }
                    writer.write_all(&buffer[..n])?;
                }
            }
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| zip_error("Failed to finalize archive", e))?;
    Ok(cursor.into_inner())
}

/// Extract `zip_path` into `destination`, creating it if needed.
///
/// Entries whose names would escape `destination` are skipped.
pub fn extract_zip(zip_path: &Path, destination: &Path) -> AppResult<usize> {
    let file = File::open(zip_path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| zip_error("Downloaded file is not a valid zip", e))?;

    if archive.len() > MAX_ZIP_ENTRIES {
        return Err(AppError::validation(format!(
            "Archive has {} entries, limit is {MAX_ZIP_ENTRIES}",
            archive.len()
        )));
    }

    fs::create_dir_all(destination)?;
    let mut total_size = 0u64;
    let mut extracted = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| zip_error("Failed to read archive entry", e))?;

        let Some(name) = entry.enclosed_name() else {
            continue;
        };
        let out_path = destination.join(name);

        total_size += entry.size();
        if total_size > MAX_EXTRACTED_SIZE {
            return Err(AppError::validation(format!(
                "Archive exceeds extraction limit of {MAX_EXTRACTED_SIZE} bytes"
            )));
        }

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    Ok(extracted)
}
