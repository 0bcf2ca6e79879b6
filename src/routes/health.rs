use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses(
        (status = 200, description = "Storage attached and healthy", body = HealthResponse),
        (status = 503, description = "Running in degraded mode", body = HealthResponse)
    )
)]
/// Report storage and scheduler health; `503` while degraded.
pub async fn healthcheck(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let health = health_service::health_status(&state).await;
    let code = match health.status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(health))
}

/// Health routes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/healthcheck", get(healthcheck))
}
