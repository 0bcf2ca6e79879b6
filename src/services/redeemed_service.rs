use tracing::info;

use crate::{
    dao::models::RedeemedCodeEntity,
    dto::redeemed::{RedeemCodeRequest, RedeemedCodeResponse, RedeemedStatusResponse},
    error::ServiceError,
    state::{SharedState, codes::GameId},
};

/// Record `request.code` as redeemed for `game`. An earlier record of the same code is
/// kept and returned unchanged.
pub async fn mark_redeemed(
    state: &SharedState,
    game: GameId,
    request: RedeemCodeRequest,
) -> Result<RedeemedCodeResponse, ServiceError> {
    let store = state.require_codes_store().await?;

    let RedeemCodeRequest {
        code,
        rewards,
        source,
    } = request;

    let reward_json = if rewards.is_empty() {
        None
    } else {
        Some(
            serde_json::to_string(&rewards)
                .map_err(|err| ServiceError::InvalidInput(err.to_string()))?,
        )
    };

    let entity = RedeemedCodeEntity {
        game,
        code: code.clone(),
        redeemed_at: state.clock().now_epoch_secs(),
        reward_json,
        source,
    };
    store.mark_redeemed(entity.clone()).await?;
    info!(game = %game, code = %code, "code marked as redeemed");

    let stored = store
        .list_redeemed(Some(game))
        .await?
        .into_iter()
        .find(|row| row.code == code)
        .unwrap_or(entity);

    Ok(stored.into())
}

/// Whether `code` has been redeemed for `game`.
pub async fn redeemed_status(
    state: &SharedState,
    game: GameId,
    code: String,
) -> Result<RedeemedStatusResponse, ServiceError> {
    let store = state.require_codes_store().await?;
    let redeemed = store.is_redeemed(game, &code).await?;
    Ok(RedeemedStatusResponse {
        game,
        code,
        redeemed,
    })
}

/// Redeemed codes, newest first, optionally limited to one game.
pub async fn list_redeemed(
    state: &SharedState,
    game: Option<GameId>,
) -> Result<Vec<RedeemedCodeResponse>, ServiceError> {
    let store = state.require_codes_store().await?;
    let rows = store.list_redeemed(game).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::storage::StorageError,
        test_support::{ScriptedSource, test_state},
    };

    fn request(code: &str, rewards: &[&str]) -> RedeemCodeRequest {
        RedeemCodeRequest {
            code: code.into(),
            rewards: rewards.iter().map(|reward| reward.to_string()).collect(),
            source: Some("manual".into()),
        }
    }

    #[tokio::test]
    async fn first_redemption_wins() {
        let (state, clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;

        let first = mark_redeemed(
            &state,
            GameId::Genshin,
            request("GENSHINGIFT", &["Primogem x50"]),
        )
        .await
        .unwrap();
        clock.advance(60);
        let second = mark_redeemed(&state, GameId::Genshin, request("GENSHINGIFT", &[]))
            .await
            .unwrap();

        assert_eq!(first.rewards, ["Primogem x50"]);
        assert_eq!(second.rewards, ["Primogem x50"]);
        assert_eq!(second.redeemed_at, first.redeemed_at);
    }

    #[tokio::test]
    async fn codes_are_scoped_per_game() {
        let (state, clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;

        mark_redeemed(&state, GameId::Starrail, request("SHARED", &[]))
            .await
            .unwrap();
        clock.advance(10);
        mark_redeemed(&state, GameId::Honkai, request("NEWER", &[]))
            .await
            .unwrap();

        let status = redeemed_status(&state, GameId::Starrail, "SHARED".into())
            .await
            .unwrap();
        assert!(status.redeemed);
        let status = redeemed_status(&state, GameId::Zenless, "SHARED".into())
            .await
            .unwrap();
        assert!(!status.redeemed);

        let all = list_redeemed(&state, None).await.unwrap();
        let codes: Vec<_> = all.iter().map(|row| row.code.as_str()).collect();
        assert_eq!(codes, ["NEWER", "SHARED"]);

        let starrail = list_redeemed(&state, Some(GameId::Starrail)).await.unwrap();
        assert_eq!(starrail.len(), 1);
        assert_eq!(starrail[0].game, GameId::Starrail);
    }

    #[tokio::test]
    async fn ledger_requires_storage() {
        let (state, _clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;
        state.clear_codes_store().await;

        let err = list_redeemed(&state, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(StorageError::Detached)));
    }
}
