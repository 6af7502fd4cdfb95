//! Processors module - domain-specific processing logic
//!
//! This module contains the following submodules:
//! - `upload`: Upload validation and persistence
//! - `file`: Ownership and cleanup of stored uploads
//! - `image`: Orientation correction and re-encoding
//! - `metadata`: EXIF orientation lookup
//! - `orientation`: The eight EXIF orientation values and their transforms
//! - `setup`: Initialization setup (logger, folder creation)

pub mod file;
pub mod image;
pub mod metadata;
pub mod orientation;
pub mod setup;
pub mod upload;

#[cfg(test)]
pub(crate) mod fixtures;
