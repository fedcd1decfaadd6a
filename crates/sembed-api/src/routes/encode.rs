//! Sentence encoding endpoint
//!
//! `POST /encode/` turns one sentence into a vector of length
//! `/dimensions/`. Strictly request-scoped: one inference per call, no
//! caching or batching, failures isolated to the failing request.
//!
//! ```json
//! POST /encode/
//! {"sentence": "a test sentence"}
//! ```
//!
//! Response:
//! ```json
//! {"embedding": [0.013, -0.021, ...]}
//! ```

use crate::{ApiError, ApiResult, AppState};
use axum::{Json, Router, extract::State, routing::post};
use sembed_common::CorrelationId;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Request payload for sentence encoding
///
/// The sentence may be any text, including the empty string; inputs longer
/// than the model's token limit are truncated by the tokenizer.
#[derive(Debug, Deserialize, Serialize)]
pub struct EncodeRequest {
    /// The sentence to encode
    pub sentence: String,
}

/// Response with the embedding vector
#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeResponse {
    /// Ordered vector of length equal to the model's dimensionality
    pub embedding: Vec<f32>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/encode/", post(encode_sentence))
}

#[instrument(skip(state, request), fields(correlation_id))]
async fn encode_sentence(
    State(state): State<AppState>,
    Json(request): Json<EncodeRequest>,
) -> ApiResult<Json<EncodeResponse>> {
    let correlation_id = CorrelationId::new();
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    info!(
        correlation_id = %correlation_id,
        bytes = request.sentence.len(),
        "Encode request"
    );

    let embedding = state
        .encoder
        .encode(&request.sentence)
        .await
        .map_err(|e| ApiError::from_embedding(&e, correlation_id))?;

    Ok(Json(EncodeResponse { embedding }))
}
