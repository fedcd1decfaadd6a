use crate::AppState;
use axum::{Json, Router, extract::State, routing::get};
use serde_json::json;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness probe; reports which model is being served
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "sembed-api",
        "model": state.encoder.model_id(),
    }))
}
