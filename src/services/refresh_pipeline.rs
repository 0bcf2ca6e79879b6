//! Per-game refresh pipeline: fetch, normalize, diff against the last snapshot, emit.

use futures::future::join_all;
use tracing::info;

use crate::{
    error::ServiceError,
    services::codes_service,
    state::{
        SharedState,
        change_detector::ChangeEvent,
        codes::{CodesPayload, GameId},
    },
};

/// Result of one successful game refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Normalized payload, also written to the cache.
    pub payload: CodesPayload,
    /// Codes that became active since the previous refresh of the game.
    pub event: ChangeEvent,
}

/// Force-refresh `game` and diff the result against its snapshot.
///
/// The game's snapshot stays locked from the fetch until the event is published, so two
/// refreshes of the same game never interleave. A failed fetch leaves the snapshot
/// untouched.
pub async fn refresh_game(
    state: &SharedState,
    game: GameId,
) -> Result<RefreshOutcome, ServiceError> {
    let mut snapshot = state.detector().lock(game).await;

    let payload = codes_service::refresh_codes(state, game).await?;
    let event = snapshot.observe(&payload);

    if !event.is_empty() {
        info!(game = %game, new_codes = ?event.new_codes, "new codes detected");
        state.publish_change(event.clone());
    }

    Ok(RefreshOutcome { payload, event })
}

/// Refresh every tracked game concurrently and wait for all of them to settle.
///
/// One game's failure neither cancels nor delays the others.
pub async fn refresh_all(
    state: &SharedState,
) -> Vec<(GameId, Result<RefreshOutcome, ServiceError>)> {
    join_all(
        GameId::ALL
            .into_iter()
            .map(|game| async move { (game, refresh_game(state, game).await) }),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        state::change_detector::{ActiveSnapshot, FirstObservation},
        test_support::{ScriptedSource, payload, test_state},
    };

    fn config(first_observation: FirstObservation) -> AppConfig {
        AppConfig {
            first_observation,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn second_refresh_reports_added_codes_to_subscribers() {
        let source = ScriptedSource::new();
        source.push(GameId::Genshin, payload(&["A", "B"], &[]));
        source.push(GameId::Genshin, payload(&["B", "C"], &[]));
        let (state, _clock) = test_state(&config(FirstObservation::Baseline), source).await;
        let mut changes = state.subscribe_changes();

        let first = refresh_game(&state, GameId::Genshin).await.unwrap();
        assert!(first.event.is_empty());
        assert!(changes.try_recv().is_err());

        let second = refresh_game(&state, GameId::Genshin).await.unwrap();
        assert_eq!(second.event.new_codes, ["C"]);
        let received = changes.recv().await.unwrap();
        assert_eq!(received, second.event);
    }

    #[tokio::test]
    async fn report_all_emits_the_first_snapshot() {
        let source = ScriptedSource::new();
        source.push(GameId::Honkai, payload(&["H1", "H2"], &[]));
        let (state, _clock) = test_state(&config(FirstObservation::ReportAll), source).await;

        let outcome = refresh_game(&state, GameId::Honkai).await.unwrap();
        assert_eq!(outcome.event.new_codes, ["H1", "H2"]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_previous_snapshot() {
        let source = ScriptedSource::new();
        source.push(GameId::Starrail, payload(&["A"], &[]));
        source.push_failure(GameId::Starrail);
        source.push(GameId::Starrail, payload(&["A", "B"], &[]));
        let (state, _clock) = test_state(&config(FirstObservation::Baseline), source).await;

        refresh_game(&state, GameId::Starrail).await.unwrap();
        assert!(refresh_game(&state, GameId::Starrail).await.is_err());

        let expected: ActiveSnapshot = ActiveSnapshot::Tracked(["A".to_string()].into());
        assert_eq!(state.detector().snapshot(GameId::Starrail).await, expected);

        let outcome = refresh_game(&state, GameId::Starrail).await.unwrap();
        assert_eq!(outcome.event.new_codes, ["B"]);
    }

    #[tokio::test]
    async fn fan_out_isolates_a_failing_game() {
        let source = ScriptedSource::new();
        for game in GameId::ALL {
            if game == GameId::Zenless {
                source.push_failure(game);
            } else {
                source.push(game, payload(&[game.as_str()], &[]));
            }
        }
        let (state, _clock) = test_state(&config(FirstObservation::ReportAll), source).await;

        let results = refresh_all(&state).await;
        assert_eq!(results.len(), GameId::COUNT);

        for (game, result) in &results {
            if *game == GameId::Zenless {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap().event.new_codes, [game.as_str()]);
            }
        }
        assert_eq!(
            state.detector().snapshot(GameId::Zenless).await,
            ActiveSnapshot::Unseen
        );
    }

    #[tokio::test]
    async fn concurrent_refreshes_of_one_game_never_report_twice() {
        let source = ScriptedSource::new();
        source.push(GameId::Themis, payload(&["A"], &[]));
        source.push(GameId::Themis, payload(&["A", "B"], &[]));
        let (state, _clock) = test_state(&config(FirstObservation::ReportAll), source).await;

        let (left, right) = tokio::join!(
            refresh_game(&state, GameId::Themis),
            refresh_game(&state, GameId::Themis)
        );

        let mut reported: Vec<String> = left.unwrap().event.new_codes;
        reported.extend(right.unwrap().event.new_codes);
        reported.sort();
        assert_eq!(reported, ["A", "B"]);
    }
}
