//! Global initialization utilities for the application

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the application environment
///
/// Called once at process start to load environment variables from a `.env`
/// file when one exists. Safe to call multiple times - will only run once.
pub fn initialize_environment() {
    INIT.call_once(|| {
        if let Ok(path) = dotenvy::dotenv() {
            ::tracing::debug!("Loaded environment from {}", path.display());
        }
    });
}
