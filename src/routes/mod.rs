use axum::Router;

use crate::state::SharedState;

/// Codes listing and refresh.
pub mod codes;
/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check.
pub mod health;
/// User preferences.
pub mod prefs;
/// Redeemed codes ledger.
pub mod redeemed;
/// Change event stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(codes::router())
        .merge(redeemed::router())
        .merge(prefs::router())
        .merge(docs::router())
        .with_state(state)
}
