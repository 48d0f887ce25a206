//! API endpoints.

mod actions;
mod auth;

use axum::{Router, middleware, routing::get};

use crate::middleware::{AppState, session_middleware};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(actions::router())
        .route("/health", get(health))
}

/// Create the complete application with session decoding applied.
pub fn app(state: AppState) -> Router {
    router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
