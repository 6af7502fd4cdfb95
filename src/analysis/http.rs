use anyhow::{Context, Result, anyhow};
use log::info;
use std::time::Instant;

use super::{AnalysisRequest, AnalysisResult, Analyzer};

/// Posts the request as JSON to a long-running analysis service.
///
/// The client is blocking and has no timeout: analysis runs on a blocking
/// worker and may legitimately take minutes.
pub struct HttpAnalyzer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .context("Failed to create analyzer HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Analyzer for HttpAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let start_time = Instant::now();
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(credential) = &request.credential {
            builder = builder.bearer_auth(credential);
        }

        let response = builder
            .send()
            .context(format!("Failed to reach analyzer at {}", self.endpoint))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("analyzer responded {}: {}", status, body.trim()));
        }

        let value: serde_json::Value = response
            .json()
            .context("analyzer response is not valid JSON")?;
        let result = AnalysisResult::from_value(value)?;

        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Analyzed {:?} via {}",
            request.image_path,
            self.endpoint
        );
        Ok(result)
    }
}
