use std::{num::NonZeroU32, sync::Arc};

use serde_json::Value;
use tracing::debug;

use crate::{
    clock::Clock,
    dao::{codes_store::CodesStore, models::CacheEntryEntity, storage::StorageResult},
};

/// Keyed payload cache whose entries expire `ttl` seconds after they were written.
///
/// Expiry is evaluated on read: stale rows stay in the store but read as absent.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CodesStore>,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    /// Wrap `store`, judging freshness against `clock`.
    pub fn new(store: Arc<dyn CodesStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Return the payload stored under `key` unless it is missing or expired.
    pub async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let Some(entry) = self.store.get_cache(key).await? else {
            return Ok(None);
        };

        if entry.is_expired(self.clock.now_epoch_secs()) {
            debug!(key, fetched_at = entry.fetched_at, "cache entry expired");
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    /// Store `payload` under `key`, replacing any previous entry and restarting its TTL.
    pub async fn set(&self, key: &str, payload: Value, ttl: NonZeroU32) -> StorageResult<()> {
        self.store
            .upsert_cache(CacheEntryEntity {
                key: key.to_string(),
                payload,
                fetched_at: self.clock.now_epoch_secs(),
                ttl_seconds: ttl.get(),
            })
            .await
    }
}
