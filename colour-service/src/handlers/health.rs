use axum::{response::IntoResponse, Json};
use serde_json::json;

pub const SERVICE_NAME: &str = "colour_service";

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
