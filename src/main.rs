use anyhow::Result;
use log::{error, info};

use clothing_analysis_api::analysis::analyzer_from_config;
use clothing_analysis_api::build_rocket;
use clothing_analysis_api::common::ROCKET_RUNTIME;
use clothing_analysis_api::config::AppConfig;
use clothing_analysis_api::workflow::processors::setup::{initialize_folder, initialize_logger};

fn main() -> Result<()> {
    initialize_logger();
    let config = AppConfig::load()?;
    initialize_folder(&config)?;

    // Built outside the runtime: the blocking HTTP client must not be created or dropped in async context
    let analyzer = analyzer_from_config(&config)?;
    info!("Listening on {}:{}", config.host, config.port);

    let result = ROCKET_RUNTIME.block_on(build_rocket(&config, analyzer).launch());
    if let Err(e) = result {
        error!("Rocket server failed: {}", e);
        return Err(anyhow::Error::from(e));
    }
    Ok(())
}
