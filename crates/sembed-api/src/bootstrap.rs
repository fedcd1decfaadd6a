//! Application bootstrap and service initialization
//!
//! Startup is strictly sequential and blocking: the model is resolved and
//! loaded before any listener is bound, and a resolution failure aborts the
//! process. No requests are accepted against a partially initialized
//! service.

use crate::AppState;
use sembed_config::ApplicationConfig;
use sembed_embeddings::{EncoderHandle, SentenceEncoder};
use std::sync::Arc;
use tracing::info;

/// Bootstrap result type
pub type BootstrapResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Resolve and load the configured model, then build the application state
///
/// # Errors
///
/// Returns an error when model resolution or loading fails; the caller must
/// treat this as fatal and exit without serving.
pub async fn initialize_app_state(config: &ApplicationConfig) -> BootstrapResult<AppState> {
    info!(model = %config.model.id, "Initializing encoder...");

    let encoder = EncoderHandle::start(&config.model, &config.resolver).await?;
    let state = AppState::new(Arc::new(encoder) as Arc<dyn SentenceEncoder>);

    info!(
        dimensions = state.dimensions,
        "Application state initialized"
    );
    Ok(state)
}
