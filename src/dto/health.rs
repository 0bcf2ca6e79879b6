use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `degraded` while the storage backend is detached or failing its checks.
    pub status: HealthStatus,
    pub storage_attached: bool,
    /// Whether the background refresh timer is active.
    pub scheduler_running: bool,
}

impl HealthResponse {
    pub fn new(storage_attached: bool, storage_healthy: bool, scheduler_running: bool) -> Self {
        let status = if storage_attached && storage_healthy {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            storage_attached,
            scheduler_running,
        }
    }
}
