#[macro_use]
extern crate rocket;

pub mod analysis;
pub mod api;
pub mod common;
pub mod config;
pub mod workflow;

use rocket::{Build, Rocket};
use std::sync::Arc;

use crate::analysis::{AnalysisSettings, Analyzer};
use crate::api::handlers::assets::ServeRoot;
use crate::api::handlers::{
    generate_analyze_routes, generate_asset_routes, generate_system_routes,
};
use crate::common::MULTIPART_OVERHEAD;
use crate::config::AppConfig;
use crate::workflow::AnalysisPipeline;
use crate::workflow::processors::upload::{Gatekeeper, UploadPolicy};

/// Assemble the server. Configuration is read here once and never again.
pub fn build_rocket(config: &AppConfig, analyzer: Arc<dyn Analyzer>) -> Rocket<Build> {
    let transfer_limit = config.transfer_limit();
    let figment = rocket::Config::figment()
        .merge(("address", config.host.clone()))
        .merge(("port", config.port))
        .merge(("limits.file", transfer_limit))
        .merge((
            "limits.data-form",
            transfer_limit.saturating_add(MULTIPART_OVERHEAD),
        ));

    let pipeline = AnalysisPipeline::new(analyzer, AnalysisSettings::from_config(config));

    rocket::custom(figment)
        .manage(Gatekeeper::new(UploadPolicy::from_config(config)))
        .manage(Arc::new(pipeline))
        .manage(ServeRoot(config.serve_root.clone()))
        .mount("/", generate_system_routes())
        .mount("/", generate_analyze_routes())
        .mount("/", generate_asset_routes())
}
