use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, ready};

use crate::dao::{
    codes_store::CodesStore,
    models::{CacheEntryEntity, RedeemedCodeEntity, UserPrefEntity},
    storage::StorageResult,
};
use crate::state::codes::GameId;

/// Process-local store used when no durable backend is configured, and in tests.
#[derive(Clone, Default)]
pub struct MemoryCodesStore {
    cache: Arc<DashMap<String, CacheEntryEntity>>,
    redeemed: Arc<DashMap<(GameId, String), RedeemedCodeEntity>>,
    prefs: Arc<DashMap<String, UserPrefEntity>>,
}

impl MemoryCodesStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodesStore for MemoryCodesStore {
    fn get_cache(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<CacheEntryEntity>>> {
        let entry = self.cache.get(key).map(|row| row.value().clone());
        ready(Ok(entry)).boxed()
    }

    fn upsert_cache(&self, entry: CacheEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.cache.insert(entry.key.clone(), entry);
        ready(Ok(())).boxed()
    }

    fn mark_redeemed(&self, entry: RedeemedCodeEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.redeemed
            .entry((entry.game, entry.code.clone()))
            .or_insert(entry);
        ready(Ok(())).boxed()
    }

    fn is_redeemed(&self, game: GameId, code: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let found = self.redeemed.contains_key(&(game, code.to_string()));
        ready(Ok(found)).boxed()
    }

    fn list_redeemed(
        &self,
        game: Option<GameId>,
    ) -> BoxFuture<'static, StorageResult<Vec<RedeemedCodeEntity>>> {
        let mut rows: Vec<RedeemedCodeEntity> = self
            .redeemed
            .iter()
            .filter(|row| game.is_none_or(|game| row.game == game))
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
        ready(Ok(rows)).boxed()
    }

    fn get_pref(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<UserPrefEntity>>> {
        let entry = self.prefs.get(key).map(|row| row.value().clone());
        ready(Ok(entry)).boxed()
    }

    fn set_pref(&self, entry: UserPrefEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.prefs.insert(entry.key.clone(), entry);
        ready(Ok(())).boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(Ok(())).boxed()
    }
}
