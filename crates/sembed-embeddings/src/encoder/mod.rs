//! Sentence encoder: model resolution, loading, and serialized inference

pub mod model;
pub mod resolver;
pub mod traits;
pub mod worker;

pub use model::SentenceModel;
pub use resolver::{
    BUNDLED_CANDIDATE_TEMPLATES, ModelFiles, ModelSource, ResolvedModel, resolve_model,
};
pub use traits::SentenceEncoder;
pub use worker::EncoderHandle;

#[cfg(any(test, feature = "test-utils"))]
pub use traits::StubEncoder;
