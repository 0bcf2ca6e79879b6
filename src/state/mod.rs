pub mod change_detector;
pub mod codes;
mod feed;

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use tokio::sync::{RwLock, broadcast, watch};

use crate::{
    clock::Clock,
    config::AppConfig,
    dao::{codes_store::CodesStore, storage::StorageError, ttl_cache::TtlCache},
    remote::CodesSource,
    services::scheduler::SchedulerSlot,
};

pub use self::change_detector::{ActiveSnapshot, ChangeDetector, ChangeEvent, FirstObservation};
pub use self::codes::{CodeItem, CodesPayload, GameId};
pub use self::feed::ChangeFeed;

/// Handle to [`AppState`] shared by routes, services and background tasks.
pub type SharedState = Arc<AppState>;

const CHANGE_FEED_CAPACITY: usize = 32;

/// Central application state: storage handle, remote source, per-game snapshots and
/// the background scheduler slot.
pub struct AppState {
    codes_store: RwLock<Option<Arc<dyn CodesStore>>>,
    degraded: watch::Sender<bool>,
    source: Arc<dyn CodesSource>,
    clock: Arc<dyn Clock>,
    detector: ChangeDetector,
    feed: ChangeFeed,
    scheduler: SchedulerSlot,
    codes_ttl: NonZeroU32,
    refresh_interval: Duration,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn CodesSource>,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            codes_store: RwLock::new(None),
            degraded: degraded_tx,
            source,
            clock,
            detector: ChangeDetector::new(config.first_observation),
            feed: ChangeFeed::new(CHANGE_FEED_CAPACITY),
            scheduler: SchedulerSlot::new(),
            codes_ttl: config.codes_ttl,
            refresh_interval: config.refresh_interval,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn codes_store(&self) -> Option<Arc<dyn CodesStore>> {
        let guard = self.codes_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with [`StorageError::Detached`].
    pub async fn require_codes_store(&self) -> Result<Arc<dyn CodesStore>, StorageError> {
        self.codes_store().await.ok_or(StorageError::Detached)
    }

    /// Install a store implementation and leave degraded mode.
    pub async fn set_codes_store(&self, store: Arc<dyn CodesStore>) {
        {
            let mut guard = self.codes_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_codes_store(&self) {
        {
            let mut guard = self.codes_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Expiring cache view over the installed store, `None` while degraded.
    pub async fn cache(&self) -> Option<TtlCache> {
        self.codes_store()
            .await
            .map(|store| TtlCache::new(store, self.clock.clone()))
    }

    /// Remote source of codes payloads.
    pub fn source(&self) -> Arc<dyn CodesSource> {
        self.source.clone()
    }

    /// Time source for cache freshness and ledger timestamps.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Per-game active-code snapshots.
    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Publish a change event to in-process subscribers.
    pub fn publish_change(&self, event: ChangeEvent) {
        self.feed.publish(event);
    }

    /// Register for change events emitted by subsequent refreshes.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    /// Slot holding the single background refresh timer.
    pub fn scheduler(&self) -> &SchedulerSlot {
        &self.scheduler
    }

    /// Freshness window of cached codes payloads.
    pub fn codes_ttl(&self) -> NonZeroU32 {
        self.codes_ttl
    }

    /// Default period of the background refresh.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}
