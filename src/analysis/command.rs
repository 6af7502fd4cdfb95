use anyhow::{Context, Result, anyhow};
use log::info;
use std::process::Command;
use std::time::Instant;

use super::{AnalysisRequest, AnalysisResult, Analyzer};

/// Runs the analysis pipeline as a child process and reads a JSON object from its stdout.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    base_args: Vec<String>,
    credential_var: String,
}

impl CommandAnalyzer {
    pub fn new(
        program: impl Into<String>,
        base_args: Vec<String>,
        credential_var: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            base_args,
            credential_var: credential_var.into(),
        }
    }

    /// The credential goes through the environment so it never shows up in `ps`.
    pub fn build_command(&self, request: &AnalysisRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg("--image-path")
            .arg(&request.image_path)
            .arg("--save-dir")
            .arg(&request.save_dir)
            .arg("--backbone")
            .arg(&request.backbone)
            .arg("--output-dir")
            .arg(&request.output_dir);
        if request.evaluate_style {
            cmd.arg("--evaluate-style");
        }
        if request.visualize {
            cmd.arg("--visualize");
        }
        match &request.credential {
            Some(credential) => cmd.env(&self.credential_var, credential),
            None => cmd.env_remove(&self.credential_var),
        };
        cmd
    }
}

impl Analyzer for CommandAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let start_time = Instant::now();
        let output = self
            .build_command(request)
            .output()
            .context(format!("Fail to spawn analysis program {:?}", self.program))?;

        if !output.status.success() {
            return Err(anyhow!(
                "analysis program failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let value = serde_json::from_slice(&output.stdout)
            .context("analysis program did not print valid JSON")?;
        let result = AnalysisResult::from_value(value)?;

        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Analyzed {:?}",
            request.image_path
        );
        Ok(result)
    }
}
