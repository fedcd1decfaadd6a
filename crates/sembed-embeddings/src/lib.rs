//! sembed embedding crate
//!
//! Loads one pre-trained sentence-embedding model and turns text into
//! fixed-length vectors. The interesting part is model resolution: bundled
//! on-disk artifacts are preferred, with a single cache-backed hub download
//! as the fallback, so the service starts without network access whenever the
//! image was built with a populated bundled-models directory.

pub mod encoder;
pub mod error;

pub use encoder::{
    BUNDLED_CANDIDATE_TEMPLATES, EncoderHandle, ModelFiles, ModelSource, ResolvedModel,
    SentenceEncoder, SentenceModel, resolve_model,
};
pub use error::{EmbeddingError, EmbeddingResult};
