use rocket::serde::json::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    status: &'static str,
    message: &'static str,
}

#[get("/health")]
pub fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        message: "API is running",
    })
}

pub fn generate_system_routes() -> Vec<rocket::Route> {
    routes![health]
}
