//! Upload gatekeeping - validation and persistence of the inbound image
//!
//! Checks run in a fixed order: field present, filename non-empty,
//! extension allowed, size within the ceiling. Only an admitted file is
//! written to the upload directory.

use anyhow::{Context, Result};
use log::{info, warn};
use rocket::fs::TempFile;
use std::{collections::HashSet, path::PathBuf, time::Instant};
use thiserror::Error;
use tokio::task::spawn_blocking;
use uuid::Uuid;

use super::file::UploadedAsset;
use crate::config::AppConfig;

const MAX_STEM_LEN: usize = 64;
const FALLBACK_STEM: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("No image file provided")]
    Missing,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Invalid file type. Allowed: {allowed}")]
    DisallowedType { allowed: String },
    #[error("File too large. Max size: {}MB", megabytes(.limit))]
    TooLarge { size: u64, limit: u64 },
}

fn megabytes(bytes: &u64) -> String {
    format!("{:.1}", *bytes as f64 / 1024.0 / 1024.0)
}

/// A file that passed validation but is not on disk yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub original_filename: String,
    pub stem: String,
    pub extension: String,
    pub byte_size: u64,
}

// ────────────────────────────────────────────────────────────────
// Policy
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_extensions: HashSet<String>,
    /// Upper-case list used in the rejection message, in configuration order
    allowed_display: String,
    max_file_size: u64,
    upload_dir: PathBuf,
}

impl UploadPolicy {
    pub fn new(
        allowed_extensions: &[String],
        max_file_size: u64,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        let allowed_display = allowed_extensions
            .iter()
            .map(|ext| display_name(ext))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            allowed_display,
            max_file_size,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.allowed_extensions,
            config.max_file_size,
            &config.upload_dir,
        )
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    /// Validate a client filename and the number of bytes actually received.
    pub fn check(&self, filename: &str, byte_size: u64) -> Result<Admission, UploadRejection> {
        if filename.is_empty() {
            return Err(UploadRejection::EmptyFilename);
        }

        let extension = extension_of(filename)
            .filter(|ext| self.allowed_extensions.contains(ext))
            .ok_or_else(|| UploadRejection::DisallowedType {
                allowed: self.allowed_display.clone(),
            })?;

        if byte_size > self.max_file_size {
            return Err(UploadRejection::TooLarge {
                size: byte_size,
                limit: self.max_file_size,
            });
        }

        Ok(Admission {
            original_filename: filename.to_string(),
            stem: storage_stem(filename),
            extension,
            byte_size,
        })
    }
}

/// How an extension is spelled in the rejection message.
fn display_name(extension: &str) -> String {
    if extension.eq_ignore_ascii_case("webp") {
        "WebP".to_string()
    } else {
        extension.to_ascii_uppercase()
    }
}

/// Lower-cased text after the last `.`; `None` when there is no dot.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Filesystem-safe prefix for the stored name, derived from the client filename.
pub fn storage_stem(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base);
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_STEM_LEN)
        .collect();
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned
    }
}

// ────────────────────────────────────────────────────────────────
// Gatekeeper
// ────────────────────────────────────────────────────────────────

pub struct Gatekeeper {
    policy: UploadPolicy,
}

impl Gatekeeper {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn inspect(&self, file: Option<&TempFile<'_>>) -> Result<Admission, UploadRejection> {
        let file = file.ok_or(UploadRejection::Missing)?;
        // a part without `filename` is a plain text value, not a file
        let filename = file
            .raw_name()
            .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str())
            .ok_or(UploadRejection::Missing)?;
        // `len` is what was actually received, not a declared size
        self.policy.check(filename, file.len())
    }

    /// Write an admitted file under a unique name in the upload directory.
    pub async fn persist(
        &self,
        file: &mut TempFile<'_>,
        admission: Admission,
    ) -> Result<UploadedAsset> {
        let start_time = Instant::now();
        let upload_dir = self.policy.upload_dir();
        tokio::fs::create_dir_all(upload_dir)
            .await
            .context(format!("failed to create upload directory {:?}", upload_dir))?;

        let unique_id = Uuid::new_v4();
        let storage_path = upload_dir.join(format!(
            "{}-{}.{}",
            admission.stem, unique_id, admission.extension
        ));

        // claimed before writing so a partial copy is cleaned up too
        let asset = UploadedAsset::claim(
            admission.original_filename,
            storage_path,
            admission.byte_size,
            upload_dir,
        );
        if let Err(err) = file.move_copy_to(asset.storage_path()).await {
            let context = format!("failed to save upload to {:?}", asset.storage_path());
            discard(asset).await;
            return Err(anyhow::Error::new(err).context(context));
        }

        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Saved upload '{}' ({} bytes) as {:?}",
            asset.original_filename(),
            asset.byte_size(),
            asset.storage_path()
        );
        Ok(asset)
    }
}

/// Drop an asset on the blocking pool: its deletion may sleep between retries.
pub async fn discard(asset: UploadedAsset) {
    if let Err(err) = spawn_blocking(move || drop(asset)).await {
        warn!("Upload cleanup task failed: {}", err);
    }
}
