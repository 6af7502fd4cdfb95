//! Request flow for one uploaded photo: upright it, analyze it, throw it away.

use anyhow::Result;
use log::info;
use std::{sync::Arc, time::Instant};

use crate::analysis::{AnalysisResult, AnalysisSettings, Analyzer};
use crate::workflow::processors::file::UploadedAsset;
use crate::workflow::processors::image::{Normalization, normalize_or_keep};

pub struct AnalysisPipeline {
    analyzer: Arc<dyn Analyzer>,
    settings: AnalysisSettings,
}

impl AnalysisPipeline {
    pub fn new(analyzer: Arc<dyn Analyzer>, settings: AnalysisSettings) -> Self {
        Self { analyzer, settings }
    }

    /// Blocking. Run on a blocking worker, never on a Rocket I/O thread.
    ///
    /// The asset is consumed: its file is gone by the time this returns,
    /// whether analysis succeeded or not.
    pub fn run(&self, asset: UploadedAsset, evaluate_style: bool) -> Result<AnalysisResult> {
        let start_time = Instant::now();

        if let Normalization::Corrected(tag) = normalize_or_keep(asset.storage_path()) {
            info!(
                "Uprighted '{}' (orientation {})",
                asset.original_filename(),
                tag.value()
            );
        }

        let request = self
            .settings
            .request_for(asset.storage_path(), evaluate_style);
        let outcome = self.analyzer.analyze(&request);
        drop(asset);

        let mut result = outcome?;
        result.normalize_visualization_paths();

        info!(duration = &*format!("{:?}", start_time.elapsed());
            "Analysis finished (style evaluation: {})",
            evaluate_style
        );
        Ok(result)
    }
}
