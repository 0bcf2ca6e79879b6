use serde_json::Value;
use tracing::debug;

use crate::{
    dao::models::UserPrefEntity, dto::prefs::PrefResponse, error::ServiceError,
    state::SharedState,
};

/// Read the preference stored under `key`; an unknown key reads as `null`.
pub async fn get_pref(state: &SharedState, key: String) -> Result<PrefResponse, ServiceError> {
    let store = state.require_codes_store().await?;
    let pref = store.get_pref(&key).await?;
    debug!(key = %key, found = pref.is_some(), "preference read");

    Ok(match pref {
        Some(entity) => entity.into(),
        None => PrefResponse::unset(key),
    })
}

/// Store `value` under `key`, replacing any previous value.
pub async fn set_pref(
    state: &SharedState,
    key: String,
    value: Value,
) -> Result<PrefResponse, ServiceError> {
    let store = state.require_codes_store().await?;
    let entity = UserPrefEntity {
        key,
        value,
        updated_at: state.clock().now_epoch_secs(),
    };
    store.set_pref(entity.clone()).await?;
    debug!(key = %entity.key, "preference stored");

    Ok(entity.into())
}
