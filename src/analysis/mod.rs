//! Boundary to the clothing analysis pipeline.
//!
//! The pipeline itself (region parsing, attribute classification, style
//! evaluation) lives outside this service. It is reached through `Analyzer`.

pub mod command;
pub mod http;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;

pub use command::CommandAnalyzer;
pub use http::HttpAnalyzer;

pub trait Analyzer: Send + Sync {
    /// One synchronous call per request; never retried.
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult>;
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub image_path: PathBuf,
    /// Model checkpoint directory
    pub save_dir: PathBuf,
    pub backbone: String,
    pub evaluate_style: bool,
    /// Never serialized; each backend hands it over out of band
    #[serde(skip)]
    pub credential: Option<String>,
    pub visualize: bool,
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("image_path", &self.image_path)
            .field("save_dir", &self.save_dir)
            .field("backbone", &self.backbone)
            .field("evaluate_style", &self.evaluate_style)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("visualize", &self.visualize)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// Whatever JSON object the pipeline returned. Only `visualizations.parsed_regions`
/// is interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(pub Map<String, Value>);

impl AnalysisResult {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(anyhow::anyhow!(
                "analysis result must be a JSON object, got: {}",
                other
            )),
        }
    }

    /// Backslash separators in the parsed-regions path become forward slashes so the
    /// path can be used as a URL.
    pub fn normalize_visualization_paths(&mut self) {
        if let Some(Value::Object(visualizations)) = self.0.get_mut("visualizations") {
            if let Some(Value::String(path)) = visualizations.get_mut("parsed_regions") {
                *path = path.replace('\\', "/");
            }
        }
    }
}

/// Fixed part of every `AnalysisRequest`, taken from configuration.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub checkpoint_dir: PathBuf,
    pub backbone: String,
    pub visualize: bool,
    pub output_dir: PathBuf,
    pub credential_var: String,
}

impl AnalysisSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            checkpoint_dir: config.checkpoint_dir.clone(),
            backbone: config.backbone.clone(),
            visualize: config.visualize,
            output_dir: config.output_dir.clone(),
            credential_var: config.credential_var.clone(),
        }
    }

    /// Read at call time so a rotated key is picked up without a restart.
    pub fn credential(&self) -> Option<String> {
        std::env::var(&self.credential_var)
            .ok()
            .filter(|value| !value.is_empty())
    }

    pub fn request_for(&self, image_path: impl Into<PathBuf>, evaluate_style: bool) -> AnalysisRequest {
        AnalysisRequest {
            image_path: image_path.into(),
            save_dir: self.checkpoint_dir.clone(),
            backbone: self.backbone.clone(),
            evaluate_style,
            credential: self.credential(),
            visualize: self.visualize,
            output_dir: self.output_dir.clone(),
        }
    }
}

/// HTTP backend when `analyzer_url` is configured, subprocess otherwise.
pub fn analyzer_from_config(config: &AppConfig) -> Result<Arc<dyn Analyzer>> {
    match &config.analyzer_url {
        Some(url) => Ok(Arc::new(HttpAnalyzer::new(url)?)),
        None => Ok(Arc::new(CommandAnalyzer::new(
            &config.analyzer_program,
            config.analyzer_args.clone(),
            &config.credential_var,
        ))),
    }
}
