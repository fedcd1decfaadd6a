//! Error types for the sembed-embeddings crate

use thiserror::Error;

/// Result type alias for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Error type for model resolution and embedding operations
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No bundled candidate existed and the fallback load failed.
    /// Fatal at startup; the server must not begin accepting requests.
    #[error("Model resolution failed: {0}")]
    Resolve(String),

    /// Model loading and initialization errors
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    /// Tokenization and text processing errors
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// Inference and tensor computation errors
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The inference worker is no longer running
    #[error("Encoder unavailable: {0}")]
    EncoderClosed(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbeddingError {
    /// Create a model loading error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create an inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}
