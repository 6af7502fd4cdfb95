//! Image processing module - makes stored pixels upright before analysis
//!
//! Includes:
//! - Format detection and decoding
//! - Orientation lookup and correction
//! - In-place re-encoding

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder};
use log::{info, warn};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use super::metadata::OrientationSource;
use super::orientation::OrientationTag;
use crate::common::JPEG_QUALITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// No orientation, orientation 1, or correction failed
    Unchanged,
    Corrected(OrientationTag),
}

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

/// Rotate/flip the image at `path` according to its EXIF orientation and
/// overwrite it. Never fails: problems are logged and the file is left as it was.
pub fn normalize_or_keep(path: &Path) -> Normalization {
    match normalize_orientation(path) {
        Ok(normalization) => normalization,
        Err(err) => {
            warn!("Could not apply EXIF orientation to {:?}: {:#}", path, err);
            Normalization::Unchanged
        }
    }
}

pub fn normalize_orientation(path: &Path) -> Result<Normalization> {
    let start_time = Instant::now();
    let reader = ImageReader::open(path)
        .context(format!("failed to open image: {:?}", path))?
        .with_guessed_format()
        .context(format!("failed to guess image format: {:?}", path))?;
    let format = reader
        .format()
        .ok_or_else(|| anyhow!("unrecognized image format: {:?}", path))?;
    let mut decoder = reader
        .into_decoder()
        .context(format!("failed to create decoder for {:?}", path))?;

    let tag = OrientationSource::detect(&mut decoder, path)
        .read_orientation()
        .context(format!("failed to read orientation of {:?}", path))?;

    let tag = match tag {
        Some(tag) if tag != OrientationTag::Normal => tag,
        _ => return Ok(Normalization::Unchanged),
    };

    let dynamic_image = DynamicImage::from_decoder(decoder)
        .context(format!("failed to decode image: {:?}", path))?;
    let corrected = tag.apply(dynamic_image);

    write_in_place(path, &corrected, format)?;

    info!(duration = &*format!("{:?}", start_time.elapsed());
        "Applied EXIF orientation {} to {:?} ({}x{})",
        tag.value(),
        path,
        corrected.width(),
        corrected.height()
    );
    Ok(Normalization::Corrected(tag))
}

// ────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────

/// Encode next to the original, then rename over it.
fn write_in_place(path: &Path, dynamic_image: &DynamicImage, format: ImageFormat) -> Result<()> {
    let staging = staging_path(path)?;

    if let Err(err) = encode_to(&staging, dynamic_image, format) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }

    fs::rename(&staging, path).map_err(|err| {
        let _ = fs::remove_file(&staging);
        anyhow!(err).context(format!("failed to replace {:?} with corrected image", path))
    })
}

fn staging_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("path has no usable file name: {:?}", path))?;
    Ok(path.with_file_name(format!(".{}.orienting", file_name)))
}

fn encode_to(path: &Path, dynamic_image: &DynamicImage, format: ImageFormat) -> Result<()> {
    let file = File::create(path).context(format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            DynamicImage::ImageRgb8(dynamic_image.to_rgb8())
                .write_with_encoder(encoder)
                .context(format!("failed to encode JPEG to {:?}", path))?;
        }
        other => dynamic_image
            .write_to(&mut writer, other)
            .context(format!("failed to encode {:?} to {:?}", other, path))?,
    }

    writer
        .flush()
        .context(format!("failed to flush {:?}", path))?;
    Ok(())
}
