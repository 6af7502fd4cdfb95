//! Orientation metadata lookup.
//!
//! Decoders that understand EXIF hand out the raw block; for the rest the
//! file container is scanned directly. Callers only see `read_orientation`.

use anyhow::{Context, Result};
use exif::{In, Reader, Tag};
use image::ImageDecoder;
use log::debug;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use super::orientation::OrientationTag;

const EXIF_HEADER: &[u8] = b"Exif\0\0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrientationSource {
    /// Raw EXIF block obtained from the image decoder
    Embedded(Vec<u8>),
    /// Decoder offers no EXIF access; read the container on disk
    Container(PathBuf),
}

impl OrientationSource {
    pub fn detect<D: ImageDecoder>(decoder: &mut D, path: &Path) -> Self {
        match decoder.exif_metadata() {
            Ok(Some(raw)) => Self::Embedded(raw),
            Ok(None) => Self::Container(path.to_path_buf()),
            Err(err) => {
                debug!("Decoder could not expose EXIF for {:?}: {}", path, err);
                Self::Container(path.to_path_buf())
            }
        }
    }

    /// `Ok(None)` when there is no EXIF, no orientation field, or a value outside 1..=8.
    pub fn read_orientation(&self) -> Result<Option<OrientationTag>> {
        let reader = Reader::new();
        let parsed = match self {
            Self::Embedded(raw) => {
                let tiff = raw.strip_prefix(EXIF_HEADER).unwrap_or(raw.as_slice());
                reader.read_raw(tiff.to_vec())
            }
            Self::Container(path) => {
                let file = File::open(path)
                    .context(format!("failed to open {:?} for EXIF scan", path))?;
                reader.read_from_container(&mut BufReader::new(file))
            }
        };

        let exif = match parsed {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err).context("failed to parse EXIF metadata"),
        };

        Ok(exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .and_then(OrientationTag::from_exif))
    }
}
