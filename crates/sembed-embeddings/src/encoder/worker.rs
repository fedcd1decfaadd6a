//! Single shared inference worker
//!
//! The loaded model is owned by exactly one spawned task; requests arrive
//! over an mpsc channel and answers return over per-request oneshot
//! channels. The model runtime is not proven reentrant, so this is where
//! inference is serialized - handlers share the cheap `EncoderHandle` freely
//! and never touch the model directly. Requests are processed one at a time
//! with no batching: one inference per encode call.

use crate::encoder::model::SentenceModel;
use crate::encoder::resolver::resolve_model;
use crate::encoder::traits::SentenceEncoder;
use crate::{EmbeddingError, EmbeddingResult};
use async_trait::async_trait;
use sembed_config::{ModelConfig, ResolverConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Type alias for the per-request reply
type EncodeResponse = EmbeddingResult<Vec<f32>>;

/// One queued encode request
struct EncodeRequest {
    sentence: String,
    response_tx: oneshot::Sender<EncodeResponse>,
}

/// Seam between the worker loop and the model, so worker behavior is
/// testable without loading weights
pub(crate) trait InferenceBackend: Send + 'static {
    fn encode(&self, sentence: &str) -> EncodeResponse;
    fn dimensions(&self) -> usize;
    fn model_id(&self) -> &str;
}

impl InferenceBackend for SentenceModel {
    fn encode(&self, sentence: &str) -> EncodeResponse {
        Self::encode(self, sentence)
    }

    fn dimensions(&self) -> usize {
        Self::dimensions(self)
    }

    fn model_id(&self) -> &str {
        Self::model_id(self)
    }
}

/// Cheap, cloneable handle to the inference worker
///
/// Dimensionality and model identifier are captured at spawn time; both are
/// invariant for the process lifetime.
#[derive(Clone)]
pub struct EncoderHandle {
    request_tx: mpsc::UnboundedSender<EncodeRequest>,
    dimensions: usize,
    model_id: Arc<str>,
}

impl EncoderHandle {
    /// Resolve, load, and start serving the configured model
    ///
    /// Runs the full startup sequence: bundled-candidate resolution (hub
    /// fallback included), eager model load, then worker spawn. Blocks until
    /// the model is ready; there is no request service before this returns.
    ///
    /// # Errors
    /// Returns `EmbeddingError::Resolve` or `EmbeddingError::ModelLoad` on
    /// failure; both are fatal startup conditions for the caller.
    pub async fn start(model: &ModelConfig, resolver: &ResolverConfig) -> EmbeddingResult<Self> {
        tracing::info!(model = %model.id, "Loading model");

        let resolved =
            resolve_model(&model.id, Path::new(&resolver.bundled_models_dir)).await?;
        let loaded = SentenceModel::load(&model.id, &resolved.files, model.max_tokens)?;

        tracing::info!(
            model = %model.id,
            dimensions = loaded.dimensions(),
            source = ?resolved.source,
            "Model loaded"
        );
        Ok(Self::spawn(loaded))
    }

    /// Spawn the worker for an already-loaded model
    pub fn spawn(model: SentenceModel) -> Self {
        Self::spawn_backend(model)
    }

    fn spawn_backend<B: InferenceBackend>(backend: B) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let dimensions = backend.dimensions();
        let model_id: Arc<str> = backend.model_id().into();

        tokio::spawn(encode_worker(backend, request_rx));

        Self {
            request_tx,
            dimensions,
            model_id,
        }
    }
}

#[async_trait]
impl SentenceEncoder for EncoderHandle {
    async fn encode(&self, sentence: &str) -> EmbeddingResult<Vec<f32>> {
        let (response_tx, response_rx) = oneshot::channel();
        let request = EncodeRequest {
            sentence: sentence.to_string(),
            response_tx,
        };

        self.request_tx
            .send(request)
            .map_err(|_| EmbeddingError::EncoderClosed("Worker stopped".to_string()))?;

        response_rx
            .await
            .map_err(|_| EmbeddingError::EncoderClosed("Worker dropped response".to_string()))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Worker loop: exclusive model access, one request at a time
async fn encode_worker<B: InferenceBackend>(
    backend: B,
    mut request_rx: mpsc::UnboundedReceiver<EncodeRequest>,
) {
    while let Some(request) = request_rx.recv().await {
        let result = backend.encode(&request.sentence);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Encode request failed");
        }
        // Requester may have dropped its end; nothing to do then
        if request.response_tx.send(result).is_err() {
            tracing::debug!("Requester dropped response channel");
        }
    }
    tracing::debug!("Encoder worker shutting down (channel closed)");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic backend: each vector is derived from the input sentence
    struct TestBackend {
        dimensions: usize,
    }

    impl InferenceBackend for TestBackend {
        fn encode(&self, sentence: &str) -> EncodeResponse {
            if sentence == "reject me" {
                return Err(EmbeddingError::Inference("input rejected".to_string()));
            }
            let seed: f32 = sentence.bytes().map(f32::from).sum();
            Ok((0..self.dimensions).map(|i| seed + i as f32).collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn model_id(&self) -> &str {
            "test-backend"
        }
    }

    fn expected(sentence: &str, dimensions: usize) -> Vec<f32> {
        let seed: f32 = sentence.bytes().map(f32::from).sum();
        (0..dimensions).map(|i| seed + i as f32).collect()
    }

    #[tokio::test]
    async fn every_vector_matches_the_reported_dimension() {
        let handle = EncoderHandle::spawn_backend(TestBackend { dimensions: 384 });

        assert_eq!(handle.dimensions(), 384);
        for sentence in ["test sentence", "another one", "a third"] {
            let vector = handle.encode(sentence).await.unwrap();
            assert_eq!(vector.len(), handle.dimensions());
        }
    }

    #[tokio::test]
    async fn empty_sentence_encodes_successfully() {
        let handle = EncoderHandle::spawn_backend(TestBackend { dimensions: 768 });

        let vector = handle.encode("").await.unwrap();
        assert_eq!(vector.len(), 768);
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_cross_contaminate() {
        let handle = EncoderHandle::spawn_backend(TestBackend { dimensions: 8 });

        let (a, b, c) = tokio::join!(
            handle.encode("alpha"),
            handle.encode("beta"),
            handle.encode("gamma"),
        );

        assert_eq!(a.unwrap(), expected("alpha", 8));
        assert_eq!(b.unwrap(), expected("beta", 8));
        assert_eq!(c.unwrap(), expected("gamma", 8));
    }

    #[tokio::test]
    async fn a_failed_request_does_not_poison_the_worker() {
        let handle = EncoderHandle::spawn_backend(TestBackend { dimensions: 8 });

        let err = handle.encode("reject me").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Inference(_)));

        // The worker keeps serving after a per-request failure
        let vector = handle.encode("still alive").await.unwrap();
        assert_eq!(vector, expected("still alive", 8));
    }

    #[tokio::test]
    async fn model_id_is_exposed() {
        let handle = EncoderHandle::spawn_backend(TestBackend { dimensions: 8 });
        assert_eq!(handle.model_id(), "test-backend");
    }
}
