//! Trait abstraction over the sentence encoder
//!
//! Request handlers depend on this trait rather than the concrete worker
//! handle, so tests can substitute a stub without loading model weights.

use crate::EmbeddingResult;
use async_trait::async_trait;

/// A ready sentence encoder
///
/// Implementations are immutable after construction: `dimensions()` is fixed
/// for the lifetime of the value and equals the length of every vector
/// `encode` returns.
#[async_trait]
pub trait SentenceEncoder: Send + Sync {
    /// Encode one sentence into a fixed-length vector
    async fn encode(&self, sentence: &str) -> EmbeddingResult<Vec<f32>>;

    /// Dimensionality of the produced vectors
    fn dimensions(&self) -> usize;

    /// The configured model identifier
    fn model_id(&self) -> &str;
}

/// Stub implementation for tests: deterministic vectors, no model weights
#[cfg(any(test, feature = "test-utils"))]
pub struct StubEncoder {
    dimensions: usize,
    fail: bool,
}

#[cfg(any(test, feature = "test-utils"))]
impl StubEncoder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: false,
        }
    }

    /// Make every encode call fail, for error-path tests
    #[must_use]
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// The deterministic vector this stub produces for a sentence
    pub fn expected_vector(&self, sentence: &str) -> Vec<f32> {
        let seed: f32 = sentence.bytes().map(f32::from).sum();
        (0..self.dimensions)
            .map(|i| seed + i as f32)
            .collect()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl SentenceEncoder for StubEncoder {
    async fn encode(&self, sentence: &str) -> EmbeddingResult<Vec<f32>> {
        if self.fail {
            return Err(crate::EmbeddingError::Inference(
                "Stub encoder failure".to_string(),
            ));
        }
        Ok(self.expected_vector(sentence))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "stub-encoder"
    }
}
