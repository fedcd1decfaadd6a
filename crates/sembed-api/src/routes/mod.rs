pub mod dimensions;
pub mod encode;
pub mod health;

use crate::AppState;
use axum::Router;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(dimensions::routes())
        .merge(encode::routes())
        .with_state(state)
}
