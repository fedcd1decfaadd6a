//! Dimensionality endpoint
//!
//! Reports the fixed embedding dimension of the loaded model. Side-effect
//! free; always succeeds once startup has completed.

use crate::AppState;
use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

/// Response for `GET /dimensions/`
#[derive(Debug, Serialize, Deserialize)]
pub struct DimensionsResponse {
    /// Length of every vector the encode endpoint returns
    pub dimensions: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/dimensions/", get(get_dimensions))
}

async fn get_dimensions(State(state): State<AppState>) -> Json<DimensionsResponse> {
    Json(DimensionsResponse {
        dimensions: state.dimensions,
    })
}
