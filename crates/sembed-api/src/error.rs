//! Structured API error handling for the sembed API
//!
//! Request-level failures are isolated to their request: an encode that the
//! model runtime rejects produces a JSON error response with a correlation
//! ID, never a process crash. Every response carries the correlation ID in
//! an `X-Correlation-ID` header so a failing call can be matched to its log
//! events.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sembed_common::CorrelationId;
use sembed_embeddings::EmbeddingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// API error types with correlation IDs for request tracking
#[derive(Debug, Error)]
pub enum ApiError {
    /// The model runtime rejected this input.
    ///
    /// Isolated to the request; other requests and process state are
    /// unaffected.
    #[error("Encoding failed: {reason} (correlation: {correlation_id})")]
    EncodingFailed {
        reason: String,
        correlation_id: CorrelationId,
    },

    /// The inference worker is gone; the service cannot encode anything.
    #[error("Encoder unavailable (correlation: {correlation_id})")]
    EncoderUnavailable { correlation_id: CorrelationId },

    /// An unexpected internal error.
    #[error("Internal server error (correlation: {correlation_id})")]
    InternalServerError { correlation_id: CorrelationId },
}

/// Error response sent to API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Correlation ID for tracking and support
    pub correlation_id: CorrelationId,
}

impl ApiError {
    /// Map an embedding failure for one request to its API error
    pub fn from_embedding(err: &EmbeddingError, correlation_id: CorrelationId) -> Self {
        match err {
            EmbeddingError::Tokenization(_) | EmbeddingError::Inference(_) => {
                Self::EncodingFailed {
                    reason: err.to_string(),
                    correlation_id,
                }
            }
            EmbeddingError::EncoderClosed(_) => Self::EncoderUnavailable { correlation_id },
            _ => Self::InternalServerError { correlation_id },
        }
    }

    /// Get the correlation ID from any error variant
    pub const fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::EncodingFailed { correlation_id, .. }
            | Self::EncoderUnavailable { correlation_id }
            | Self::InternalServerError { correlation_id } => correlation_id,
        }
    }

    /// Get the HTTP status code for this error
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::EncodingFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EncoderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn error_code(&self) -> &'static str {
        match self {
            Self::EncodingFailed { .. } => "ENCODING_FAILED",
            Self::EncoderUnavailable { .. } => "ENCODER_UNAVAILABLE",
            Self::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let correlation_id = self.correlation_id().clone();

        match &self {
            Self::EncodingFailed { .. } => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %self,
                    "Request-level encoding error"
                );
            }
            Self::EncoderUnavailable { .. } | Self::InternalServerError { .. } => {
                error!(
                    correlation_id = %correlation_id,
                    error = %self,
                    "Server error"
                );
            }
        }

        let error_response = ApiErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            correlation_id: correlation_id.clone(),
        };

        let mut response = (status, Json(error_response)).into_response();

        if let Ok(header_value) = correlation_id.to_string().parse() {
            response
                .headers_mut()
                .insert("X-Correlation-ID", header_value);
        }

        response
    }
}

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;
