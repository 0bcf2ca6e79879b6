//! Per-game tracking of active codes and computation of newly active deltas.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use utoipa::ToSchema;

use crate::state::codes::{CodesPayload, GameId};

/// How the very first observation of a game after process start is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstObservation {
    /// The first snapshot only seeds the baseline and reports nothing.
    #[default]
    Baseline,
    /// Every active code of the first snapshot is reported as new.
    ReportAll,
}

/// Codes that became active for a game since its previous refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChangeEvent {
    /// Game whose refresh produced the event.
    pub game: GameId,
    /// Newly active codes in the order they appear in the refreshed active list.
    pub new_codes: Vec<String>,
}

impl ChangeEvent {
    /// Whether the refresh surfaced no new codes.
    pub fn is_empty(&self) -> bool {
        self.new_codes.is_empty()
    }
}

/// Last known active set of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActiveSnapshot {
    /// No refresh has completed for the game yet.
    #[default]
    Unseen,
    /// Active codes observed by the most recent refresh.
    Tracked(HashSet<String>),
}

/// Arena of per-game snapshots, each behind its own lock so unrelated games never
/// serialize on each other.
pub struct ChangeDetector {
    policy: FirstObservation,
    slots: [Mutex<ActiveSnapshot>; GameId::COUNT],
}

impl ChangeDetector {
    /// Build a detector where every game starts [`ActiveSnapshot::Unseen`].
    pub fn new(policy: FirstObservation) -> Self {
        Self {
            policy,
            slots: std::array::from_fn(|_| Mutex::new(ActiveSnapshot::Unseen)),
        }
    }

    /// Take exclusive ownership of a game's snapshot.
    ///
    /// Holding the guard across a fetch keeps the whole fetch/diff/update sequence of
    /// one game strictly ordered.
    pub async fn lock(&self, game: GameId) -> SnapshotGuard<'_> {
        SnapshotGuard {
            game,
            policy: self.policy,
            snapshot: self.slots[game.index()].lock().await,
        }
    }

    /// Diff a normalized payload against the stored snapshot and replace it.
    pub async fn observe(&self, game: GameId, payload: &CodesPayload) -> ChangeEvent {
        self.lock(game).await.observe(payload)
    }

    /// Current snapshot of a game.
    pub async fn snapshot(&self, game: GameId) -> ActiveSnapshot {
        self.slots[game.index()].lock().await.clone()
    }
}

/// Exclusive access to one game's snapshot.
pub struct SnapshotGuard<'a> {
    game: GameId,
    policy: FirstObservation,
    snapshot: MutexGuard<'a, ActiveSnapshot>,
}

impl SnapshotGuard<'_> {
    /// Compute the newly active codes of `payload`, then replace the snapshot with its
    /// full active set. Codes that left the active list are forgotten.
    pub fn observe(&mut self, payload: &CodesPayload) -> ChangeEvent {
        let current: IndexSet<&str> = payload.active_codes().collect();

        let new_codes = match (&*self.snapshot, self.policy) {
            (ActiveSnapshot::Unseen, FirstObservation::Baseline) => Vec::new(),
            (ActiveSnapshot::Unseen, FirstObservation::ReportAll) => {
                current.iter().map(|code| code.to_string()).collect()
            }
            (ActiveSnapshot::Tracked(previous), _) => current
                .iter()
                .filter(|code| !previous.contains(**code))
                .map(|code| code.to_string())
                .collect(),
        };

        *self.snapshot =
            ActiveSnapshot::Tracked(current.into_iter().map(str::to_string).collect());

        ChangeEvent {
            game: self.game,
            new_codes,
        }
    }
}
