//! File operations module - lifetime of an uploaded file on disk
//!
//! Includes:
//! - `UploadedAsset`, the owning guard of a persisted upload
//! - Deletion with retry, restricted to the upload directory

use anyhow::{Context, Result};
use log::{info, warn};
use std::{
    fs, io,
    path::{Path, PathBuf},
    thread::sleep,
    time::Duration,
};

use crate::common::MAX_DELETE_ATTEMPTS;

const DELETE_RETRY_DELAY_MS: u64 = 50;

// ────────────────────────────────────────────────────────────────
// UploadedAsset - the stored file is removed when the guard drops
// ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct UploadedAsset {
    original_filename: String,
    storage_path: PathBuf,
    byte_size: u64,
    upload_root: PathBuf,
}

impl UploadedAsset {
    /// Take ownership of `storage_path`. From here on the file is deleted when
    /// the asset goes away, whether or not anything was written to it yet.
    pub fn claim(
        original_filename: impl Into<String>,
        storage_path: impl Into<PathBuf>,
        byte_size: u64,
        upload_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            storage_path: storage_path.into(),
            byte_size,
            upload_root: upload_root.into(),
        }
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

impl Drop for UploadedAsset {
    fn drop(&mut self) {
        if let Err(err) = delete_in_upload(&self.storage_path, &self.upload_root) {
            warn!("Upload cleanup failed: {:#}", err);
        }
    }
}

// ────────────────────────────────────────────────────────────────
// Deletion
// ────────────────────────────────────────────────────────────────

/// Remove `path` if it lives under `upload_root`. A file that is already gone counts as deleted.
pub fn delete_in_upload(path: &Path, upload_root: &Path) -> Result<()> {
    if !path_starts_with(path, upload_root) {
        if path.exists() {
            warn!("Refusing to delete {:?}: outside {:?}", path, upload_root);
        }
        return Ok(());
    }

    let mut attempts = 0;
    loop {
        attempts += 1;
        match fs::remove_file(path) {
            Ok(_) => {
                info!("Deleted file: {:?}", path);
                return Ok(());
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) if attempts < MAX_DELETE_ATTEMPTS => {
                warn!(
                    "Failed deleting {:?} (attempt {}), retrying in {}ms: {}",
                    path,
                    attempts,
                    DELETE_RETRY_DELAY_MS * attempts,
                    err
                );
                sleep(Duration::from_millis(DELETE_RETRY_DELAY_MS * attempts));
            }
            Err(err) => {
                return Err(err).context(format!(
                    "Failed deleting {:?} after {} attempts",
                    path, attempts
                ));
            }
        }
    }
}

fn path_starts_with(path: &Path, root: &Path) -> bool {
    match (fs::canonicalize(path), fs::canonicalize(root)) {
        (Ok(abs_path), Ok(abs_root)) => abs_path.starts_with(abs_root),
        _ => false,
    }
}
