//! HTTP application wiring (Axum router + shared state).
//!
//! - `state.rs`: adapters + config shared across handlers
//! - `dto.rs`: request/response JSON shapes
//! - `routes.rs`: the external-facing request and status endpoints
//! - `errors.rs`: consistent error responses

pub mod dto;
pub mod errors;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};

pub use state::AppState;

/// Builds the full HTTP router (public entrypoint used by `main.rs` and
/// integration tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(routes::router())
        .with_state(state)
}
