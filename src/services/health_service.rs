use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` while a healthy store is attached, `degraded` otherwise.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let scheduler_running = state.scheduler().is_running().await;

    let Ok(store) = state.require_codes_store().await else {
        warn!("storage unavailable (degraded mode)");
        return HealthResponse::new(false, false, scheduler_running);
    };

    let healthy = match store.health_check().await {
        Ok(()) => !state.is_degraded(),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            false
        }
    };
    HealthResponse::new(true, healthy, scheduler_running)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dto::health::HealthStatus,
        services::scheduler,
        test_support::{ScriptedSource, UnavailableStore, test_state},
    };

    #[tokio::test]
    async fn reflects_the_attached_store() {
        let (state, _clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Ok);
        assert!(health.storage_attached);

        state.set_codes_store(Arc::new(UnavailableStore)).await;
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(health.storage_attached);

        state.clear_codes_store().await;
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(!health.storage_attached);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_the_scheduler_state() {
        let (state, _clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;
        assert!(!health_status(&state).await.scheduler_running);

        scheduler::start_codes_scheduler(&state, Duration::from_secs(60)).await;
        assert!(health_status(&state).await.scheduler_running);

        scheduler::stop_codes_scheduler(&state).await;
        assert!(!health_status(&state).await.scheduler_running);
    }
}
