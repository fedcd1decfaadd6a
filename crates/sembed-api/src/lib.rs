//! sembed HTTP API
//!
//! Serves the resolved sentence-embedding model over two JSON endpoints:
//! `GET /dimensions/` and `POST /encode/`. All state is built once at
//! startup and injected into handlers; nothing is served before the model
//! is resolved and loaded.

pub mod bootstrap;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use state::AppState;
