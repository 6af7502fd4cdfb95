//! Shared helpers for the HTTP-level tests.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use clothing_analysis_api::analysis::{AnalysisRequest, AnalysisResult, Analyzer};
use clothing_analysis_api::build_rocket;
use clothing_analysis_api::config::AppConfig;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rocket::http::ContentType;
use rocket::local::blocking::Client;
use serde_json::Value;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOUNDARY: &str = "X-CLOTHING-TEST-BOUNDARY";

/// What the analyzer observed when it was called.
#[derive(Debug, Clone)]
pub struct Call {
    pub request: AnalysisRequest,
    pub file_existed: bool,
    pub dimensions: Option<(u32, u32)>,
}

pub struct RecordingAnalyzer {
    pub calls: Mutex<Vec<Call>>,
    response: Result<Value, String>,
}

impl RecordingAnalyzer {
    pub fn returning(value: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Ok(value),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Err(message.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Analyzer for RecordingAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.calls.lock().unwrap().push(Call {
            request: request.clone(),
            file_existed: request.image_path.is_file(),
            dimensions: image::image_dimensions(&request.image_path).ok(),
        });
        match &self.response {
            Ok(value) => AnalysisResult::from_value(value.clone()),
            Err(message) => Err(anyhow!(message.clone())),
        }
    }
}

/// A server wired to a scratch directory.
pub struct TestServer {
    pub client: Client,
    pub config: AppConfig,
    _root: TempDir,
}

impl TestServer {
    pub fn start(analyzer: Arc<dyn Analyzer>) -> Self {
        let root = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: root.path().join("uploads"),
            serve_root: root.path().join("static"),
            output_dir: root.path().join("static"),
            ..AppConfig::default()
        };
        std::fs::create_dir_all(&config.serve_root).unwrap();
        let client = Client::tracked(build_rocket(&config, analyzer)).unwrap();
        Self {
            client,
            config,
            _root: root,
        }
    }

    pub fn uploads_left(&self) -> usize {
        count_files(&self.config.upload_dir)
    }

    pub fn static_file(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.config.serve_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

/// Files in `dir`; a directory that was never created holds none.
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

pub fn multipart_type() -> ContentType {
    ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY))
}

/// One file part named `field`.
pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// One text part named `field`: no `filename`, so not a file.
pub fn multipart_text(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n--{b}--\r\n",
        field,
        value,
        b = BOUNDARY
    )
    .into_bytes()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([x as u8, y as u8, 64])
    }));
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Jpeg).unwrap();
    cursor.into_inner()
}

/// JPEG carrying an Exif Orientation entry.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let plain = jpeg(width, height);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut out = Vec::with_capacity(plain.len() + 40);
    out.extend_from_slice(&plain[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&plain[2..]);
    out
}
