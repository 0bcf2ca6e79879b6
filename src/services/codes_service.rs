use tracing::{debug, warn};

use crate::{
    error::ServiceError,
    state::{
        SharedState,
        codes::{CodesPayload, GameId},
    },
};

/// Return the codes of `game`, served from the cache while the entry is fresh.
///
/// A miss (absent, expired, unreadable, or no storage attached) falls through to the
/// remote source and repopulates the cache.
pub async fn list_codes(state: &SharedState, game: GameId) -> Result<CodesPayload, ServiceError> {
    let key = game.cache_key();
    if let Some(payload) = read_cached(state, &key).await {
        debug!(game = %game, "codes cache hit");
        return Ok(payload);
    }

    debug!(game = %game, "codes cache miss");
    fetch_and_store(state, game, &key).await
}

/// Fetch the codes of `game` from the remote source, overwriting any cached entry.
pub async fn refresh_codes(
    state: &SharedState,
    game: GameId,
) -> Result<CodesPayload, ServiceError> {
    fetch_and_store(state, game, &game.cache_key()).await
}

async fn fetch_and_store(
    state: &SharedState,
    game: GameId,
    key: &str,
) -> Result<CodesPayload, ServiceError> {
    let payload = state.source().fetch_codes(game).await?.normalize();
    write_cached(state, key, &payload).await;
    Ok(payload)
}

async fn read_cached(state: &SharedState, key: &str) -> Option<CodesPayload> {
    let cache = state.cache().await?;

    match cache.get(key).await {
        Ok(Some(value)) => match CodesPayload::from_value(value) {
            Ok(payload) => Some(payload.normalize()),
            Err(err) => {
                warn!(key, error = %err, "cached payload is unreadable; refetching");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(key, error = %err, "cache read failed; refetching");
            None
        }
    }
}

/// Persist `payload`; failures are logged and never reach the caller.
async fn write_cached(state: &SharedState, key: &str, payload: &CodesPayload) {
    let Some(cache) = state.cache().await else {
        debug!(key, "storage detached; skipping cache write");
        return;
    };

    let value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "failed to encode payload for cache");
            return;
        }
    };

    if let Err(err) = cache.set(key, value, state.codes_ttl()).await {
        warn!(key, error = %err, "failed to write codes cache");
    }
}
