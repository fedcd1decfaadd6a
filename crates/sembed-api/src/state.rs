//! Application state for Axum handlers
//!
//! Holds the encoder handle and its fixed dimensionality, initialized once at
//! startup and passed to all handlers by dependency injection. There is no
//! ambient global model state.

use sembed_embeddings::SentenceEncoder;
use std::sync::Arc;

/// Shared, read-only application state
///
/// Cheap to clone; the encoder is behind an `Arc` and the dimension is a
/// plain integer fixed at model-load time.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the single inference worker
    pub encoder: Arc<dyn SentenceEncoder>,
    /// Embedding dimensionality, invariant for the process lifetime
    pub dimensions: usize,
}

impl AppState {
    /// Create application state from a ready encoder
    #[must_use]
    pub fn new(encoder: Arc<dyn SentenceEncoder>) -> Self {
        let dimensions = encoder.dimensions();
        Self {
            encoder,
            dimensions,
        }
    }
}
