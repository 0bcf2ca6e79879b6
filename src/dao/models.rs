use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::codes::GameId;

/// Row of the cache table: an opaque JSON payload and its freshness window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntryEntity {
    /// Opaque key, `"<game>/codes"` by convention.
    pub key: String,
    /// Cached JSON document.
    pub payload: Value,
    /// Epoch seconds at which the payload was stored.
    pub fetched_at: i64,
    /// Seconds after `fetched_at` during which the payload is served.
    pub ttl_seconds: u32,
}

impl CacheEntryEntity {
    /// Whether the entry is stale at `now` (epoch seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.fetched_at + i64::from(self.ttl_seconds)
    }
}

/// Record of a code the user already redeemed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedeemedCodeEntity {
    /// Game the code belongs to.
    pub game: GameId,
    /// Redeemed code string.
    pub code: String,
    /// Epoch seconds of the redemption.
    pub redeemed_at: i64,
    /// Serialized reward lines captured when redeeming, if any.
    pub reward_json: Option<String>,
    /// Free-form origin of the redemption (e.g. `manual`).
    pub source: Option<String>,
}

/// A user preference: a JSON value stored under a free-form key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPrefEntity {
    /// Preference name, unique across the store.
    pub key: String,
    /// Stored JSON value.
    pub value: Value,
    /// Epoch seconds of the last write.
    pub updated_at: i64,
}
