/// DashMap-backed store.
pub mod memory;
/// SQLite-backed store.
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use futures::future::BoxFuture;

use crate::dao::{
    models::{CacheEntryEntity, RedeemedCodeEntity, UserPrefEntity},
    storage::StorageResult,
};
use crate::state::codes::GameId;

pub use self::memory::MemoryCodesStore;

/// Abstraction over the durable store backing the cache, the redeemed-codes ledger and
/// user preferences.
///
/// Single-row upserts must be atomic; upserts to distinct keys must not block each other.
pub trait CodesStore: Send + Sync {
    /// Row stored under `key`, expired or not.
    fn get_cache(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<CacheEntryEntity>>>;
    /// Insert or fully replace the row stored under `entry.key`.
    fn upsert_cache(&self, entry: CacheEntryEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Record a redemption; an existing record for the same game and code is kept.
    fn mark_redeemed(&self, entry: RedeemedCodeEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Whether `code` has been recorded for `game`.
    fn is_redeemed(&self, game: GameId, code: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Redeemed codes, newest first, optionally restricted to one game.
    fn list_redeemed(
        &self,
        game: Option<GameId>,
    ) -> BoxFuture<'static, StorageResult<Vec<RedeemedCodeEntity>>>;
    /// Preference stored under `key`, if any.
    fn get_pref(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<UserPrefEntity>>>;
    /// Insert or replace the preference stored under `entry.key`.
    fn set_pref(&self, entry: UserPrefEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend still answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
