//! Periodic background refresh of every tracked game.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, warn};

use crate::{services::refresh_pipeline, state::SharedState};

/// Shortest accepted period; `interval_at` cannot tick at zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owned handle on one running timer. Dropping it stops the timer after the current
/// tick; [`SchedulerHandle::stop`] also waits for that tick to finish.
pub struct SchedulerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Spawn a timer running `tick` every `period`, first after one full period.
    ///
    /// Ticks never overlap: a tick that outlasts the period delays the next one. A zero
    /// period is raised to [`MIN_PERIOD`].
    pub fn start<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = if period.is_zero() {
            warn!(min = ?MIN_PERIOD, "scheduler period is zero; using the minimum");
            MIN_PERIOD
        } else {
            period
        };
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => tick().await,
                }
            }
        });

        Self {
            stop: Some(stop_tx),
            task,
        }
    }

    /// Whether the timer task is still alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the timer and wait until its task has exited.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(err) = self.task.await {
            warn!(error = %err, "scheduler task ended abnormally");
        }
    }
}

/// Holder guaranteeing at most one active timer.
#[derive(Default)]
pub struct SchedulerSlot {
    current: Mutex<Option<SchedulerHandle>>,
}

impl SchedulerSlot {
    /// Slot with no timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer, stopping the previous one first if any.
    pub async fn start<F, Fut>(&self, period: Duration, tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            previous.stop().await;
        }
        *current = Some(SchedulerHandle::start(period, tick));
    }

    /// Stop the active timer. Returns `false` when none was running.
    pub async fn stop(&self) -> bool {
        let handle = self.current.lock().await.take();
        match handle {
            Some(handle) => {
                handle.stop().await;
                true
            }
            None => false,
        }
    }

    /// Whether a timer is installed and alive.
    pub async fn is_running(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(SchedulerHandle::is_running)
    }
}

/// Start (or restart) the background refresh of all games every `period`.
pub async fn start_codes_scheduler(state: &SharedState, period: Duration) {
    // The timer lives inside the state, so it only keeps a weak reference back to it.
    let weak = Arc::downgrade(state);
    state
        .scheduler()
        .start(period, move || {
            let weak = weak.clone();
            async move {
                if let Some(state) = weak.upgrade() {
                    run_tick(&state).await;
                }
            }
        })
        .await;
    info!(?period, "codes scheduler started");
}

/// Stop the background refresh. Returns `false` when it was not running.
pub async fn stop_codes_scheduler(state: &SharedState) -> bool {
    let stopped = state.scheduler().stop().await;
    if stopped {
        info!("codes scheduler stopped");
    }
    stopped
}

/// Refresh every game once. Failures are logged at debug level and otherwise dropped.
pub async fn run_tick(state: &SharedState) {
    let results = refresh_pipeline::refresh_all(state).await;

    let mut failed = 0;
    for (game, result) in &results {
        if let Err(err) = result {
            failed += 1;
            debug!(game = %game, error = %err, "background refresh failed");
        }
    }
    debug!(games = results.len(), failed, "refresh tick completed");
}
