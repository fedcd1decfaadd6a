//! Candle-backed sentence-embedding model
//!
//! Loads a BERT-family encoder plus its tokenizer from resolved files and
//! produces sentence vectors: masked mean pooling over the final hidden
//! states, then L2 normalization, matching the sentence-transformers
//! semantics of the models this service bundles.

use crate::encoder::resolver::ModelFiles;
use crate::{EmbeddingError, EmbeddingResult};
use candle_core::{D, DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::tokenizer::Tokenizer;
use tokenizers::{PaddingParams, TruncationParams};

/// A loaded sentence-embedding model
///
/// Owns the weights and tokenizer exclusively. Built once at startup from the
/// resolver's output and never mutated; the dimension reported here is
/// invariant for the process lifetime.
pub struct SentenceModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimensions: usize,
    model_id: String,
}

impl SentenceModel {
    /// Load the model eagerly from the resolved file set
    ///
    /// Inputs longer than `max_tokens` are truncated by the tokenizer rather
    /// than rejected.
    ///
    /// # Errors
    /// Returns `EmbeddingError::ModelLoad` when any file is unreadable or the
    /// weights do not match a BERT-family architecture.
    pub fn load(model_id: &str, files: &ModelFiles, max_tokens: usize) -> EmbeddingResult<Self> {
        let device = if candle_core::utils::cuda_is_available() {
            Device::new_cuda(0).unwrap_or(Device::Cpu)
        } else if candle_core::utils::metal_is_available() {
            Device::new_metal(0).unwrap_or(Device::Cpu)
        } else {
            Device::Cpu
        };

        let config_str = std::fs::read_to_string(&files.config)
            .map_err(|e| EmbeddingError::model_load(format!("Failed to read config: {e}")))?;

        // hidden_size is the authoritative embedding dimension for the
        // remainder of the process.
        let config_json: serde_json::Value = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::model_load(format!("Failed to parse config JSON: {e}")))?;
        let dimensions = config_json
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as usize)
            .ok_or_else(|| {
                EmbeddingError::model_load("Model config missing hidden_size field")
            })?;

        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::model_load(format!("Failed to parse BERT config: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| EmbeddingError::Tokenization(format!("Failed to load tokenizer: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenization(format!("Failed to set truncation: {e}")))?;

        // Weights are computed in F32 for numerical stability even when
        // stored as F16.
        let vb = if files.weights.extension().is_some_and(|ext| ext == "safetensors") {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)
                    .map_err(|e| {
                        EmbeddingError::model_load(format!("Failed to load safetensors: {e}"))
                    })?
            }
        } else {
            VarBuilder::from_pth(&files.weights, DType::F32, &device).map_err(|e| {
                EmbeddingError::model_load(format!("Failed to load pytorch weights: {e}"))
            })?
        };

        let model = BertModel::load(vb, &config)
            .map_err(|e| EmbeddingError::model_load(format!("Failed to initialize model: {e}")))?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dimensions,
            model_id: model_id.to_string(),
        })
    }

    /// Embedding dimensionality, fixed at load time
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The configured model identifier this model was resolved for
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Encode one sentence into a vector of length `dimensions()`
    ///
    /// Exactly one inference per call; the empty string is valid input (the
    /// tokenizer emits its special tokens and pooling stays well-defined).
    ///
    /// # Errors
    /// Returns `EmbeddingError::Tokenization` or `EmbeddingError::Inference`
    /// when the underlying runtime rejects the input or a tensor operation
    /// fails. These are per-request errors, not process failures.
    pub fn encode(&self, sentence: &str) -> EmbeddingResult<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(sentence, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

        let seq_len = encoding.len();
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<f32> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as f32)
            .collect();

        let input_ids = Tensor::from_vec(ids, (1, seq_len), &self.device)
            .map_err(|e| EmbeddingError::inference(format!("Failed to create input tensor: {e}")))?;
        let token_type_ids = input_ids
            .zeros_like()
            .map_err(|e| EmbeddingError::inference(format!("Failed to create type ids: {e}")))?;
        let attention_mask = Tensor::from_vec(mask, (1, seq_len), &self.device)
            .map_err(|e| EmbeddingError::inference(format!("Failed to create mask: {e}")))?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbeddingError::inference(format!("Forward pass failed: {e}")))?;

        let pooled = mean_pool(&output, &attention_mask)?;
        let normalized = l2_normalize(&pooled)?;

        let rows = normalized
            .to_dtype(DType::F32)
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(|e| EmbeddingError::inference(format!("Failed to convert output: {e}")))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::inference("Empty output batch"))
    }
}

/// Mean pooling over the sequence dimension, weighted by the attention mask
fn mean_pool(output: &Tensor, attention_mask: &Tensor) -> EmbeddingResult<Tensor> {
    let mask_expanded = attention_mask
        .unsqueeze(2)
        .and_then(|m| m.broadcast_as(output.shape()))
        .and_then(|m| m.to_dtype(output.dtype()))
        .map_err(|e| EmbeddingError::inference(format!("Failed to expand mask: {e}")))?;

    let summed = output
        .broadcast_mul(&mask_expanded)
        .and_then(|t| t.sum(1))
        .map_err(|e| EmbeddingError::inference(format!("Failed to sum embeddings: {e}")))?;

    // Count of non-padding tokens, clamped away from zero before dividing
    let counts = mask_expanded
        .sum(1)
        .and_then(|t| t.clamp(1e-9_f32, f32::INFINITY))
        .map_err(|e| EmbeddingError::inference(format!("Failed to sum mask: {e}")))?;

    summed
        .broadcast_div(&counts)
        .map_err(|e| EmbeddingError::inference(format!("Failed to divide for mean: {e}")))
}

/// L2 normalization so downstream cosine similarity is a plain dot product
fn l2_normalize(embeddings: &Tensor) -> EmbeddingResult<Tensor> {
    let norms = embeddings
        .sqr()
        .and_then(|t| t.sum_keepdim(D::Minus1))
        .and_then(|t| t.sqrt())
        .map_err(|e| EmbeddingError::inference(format!("Failed to compute norms: {e}")))?;

    embeddings
        .broadcast_div(&norms)
        .map_err(|e| EmbeddingError::inference(format!("Failed to normalize: {e}")))
}
