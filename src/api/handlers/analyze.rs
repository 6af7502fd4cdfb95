use log::{info, warn};
use rocket::State;
use rocket::form::{Errors, Form, FromForm};
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use std::sync::Arc;
use tokio::task::spawn_blocking;

use crate::analysis::AnalysisResult;
use crate::api::{AppError, AppResult};
use crate::workflow::AnalysisPipeline;
use crate::workflow::processors::upload::{Gatekeeper, UploadRejection};

#[derive(FromForm, Debug)]
pub struct AnalyzeForm<'r> {
    /// The photo to analyze; absent when the client sent some other field
    #[field(name = "image")]
    pub image: Option<TempFile<'r>>,
}

fn reject(rejection: UploadRejection) -> AppError {
    warn!("Upload rejected: {}", rejection);
    AppError::bad_request(rejection)
}

/// `true` in any letter case turns style evaluation on; anything else leaves it off.
pub fn style_flag(style_eval: Option<&str>) -> bool {
    style_eval.is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

#[post("/api/analyze?<style_eval>", data = "<form>")]
pub async fn analyze(
    gatekeeper: &State<Gatekeeper>,
    pipeline: &State<Arc<AnalysisPipeline>>,
    style_eval: Option<&str>,
    form: Result<Form<AnalyzeForm<'_>>, Errors<'_>>,
) -> AppResult<Json<AnalysisResult>> {
    let mut inner_form = match form {
        Ok(form) => form.into_inner(),
        Err(errors) => {
            let details = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            warn!("Failed to parse upload form: {}", details);
            return Err(reject(UploadRejection::Missing));
        }
    };

    let admission = gatekeeper
        .inspect(inner_form.image.as_ref())
        .map_err(reject)?;
    let Some(file) = inner_form.image.as_mut() else {
        return Err(reject(UploadRejection::Missing));
    };

    let asset = gatekeeper.persist(file, admission).await?;
    let evaluate_style = style_flag(style_eval);
    info!(
        "Analyzing '{}' (style evaluation: {})",
        asset.original_filename(),
        evaluate_style
    );

    let pipeline = Arc::clone(pipeline.inner());
    let result = spawn_blocking(move || pipeline.run(asset, evaluate_style)).await??;

    Ok(Json(result))
}

/// Catches posts the form guard forwarded because the body is not a form at all.
#[post("/api/analyze", rank = 2)]
pub fn analyze_without_form() -> AppError {
    reject(UploadRejection::Missing)
}

pub fn generate_analyze_routes() -> Vec<rocket::Route> {
    routes![analyze, analyze_without_form]
}
