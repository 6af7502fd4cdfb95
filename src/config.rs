use anyhow::{Context, Result};
use dotenv::dotenv;
use log::info;
use serde::Deserialize;
use std::path::PathBuf;

use crate::common::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};

pub const ENV_PREFIX: &str = "CLOTHING_API_";

/// Process configuration. Read once at startup and handed out by value;
/// nothing mutates it afterwards.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Address Rocket binds to
    pub host: String,
    pub port: u16,
    /// Transient storage for uploads between receipt and deletion
    pub upload_dir: PathBuf,
    /// Root for `GET /<path..>`
    pub serve_root: PathBuf,
    /// Upload ceiling in bytes
    pub max_file_size: u64,
    /// Lower-case extensions accepted by the upload gatekeeper
    pub allowed_extensions: Vec<String>,
    /// Model checkpoints, owned by the analysis pipeline
    pub checkpoint_dir: PathBuf,
    pub backbone: String,
    /// Where the analysis pipeline writes its visualizations
    pub output_dir: PathBuf,
    pub visualize: bool,
    /// Name of the environment variable forwarded as the analysis credential
    pub credential_var: String,
    pub analyzer_program: String,
    pub analyzer_args: Vec<String>,
    /// When set, the analysis pipeline is reached over HTTP instead of a subprocess
    pub analyzer_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            serve_root: PathBuf::from("."),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            checkpoint_dir: PathBuf::from("checkpoints"),
            backbone: "resnet50".to_string(),
            output_dir: PathBuf::from("."),
            visualize: true,
            credential_var: "OPENAI_API_KEY".to_string(),
            analyzer_program: "python3".to_string(),
            analyzer_args: vec!["-m".to_string(), "ml.cli".to_string()],
            analyzer_url: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and then read `CLOTHING_API_*` variables on top of the defaults.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<AppConfig>()
            .context("failed to read configuration from environment")?;
        info!(
            "Loaded config: upload_dir={:?}, serve_root={:?}, max_file_size={} bytes",
            config.upload_dir, config.serve_root, config.max_file_size
        );
        Ok(config)
    }

    /// Rocket's own per-file ceiling. Kept above `max_file_size` so oversize uploads still
    /// reach the gatekeeper and get its error message.
    pub fn transfer_limit(&self) -> u64 {
        self.max_file_size.saturating_mul(2)
    }
}
