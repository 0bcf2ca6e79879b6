use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    services::refresh_pipeline::RefreshOutcome,
    state::codes::{CodeItem, CodesPayload, GameId},
};

#[derive(Debug, Serialize, ToSchema)]
/// Current codes of one game.
pub struct CodesResponse {
    pub game: GameId,
    pub active: Vec<CodeItem>,
    pub inactive: Vec<CodeItem>,
}

impl CodesResponse {
    pub fn new(game: GameId, payload: CodesPayload) -> Self {
        Self {
            game,
            active: payload.active,
            inactive: payload.inactive,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Codes fetched by an explicit refresh, with the ones that just became active.
pub struct RefreshResponse {
    pub game: GameId,
    pub active: Vec<CodeItem>,
    pub inactive: Vec<CodeItem>,
    /// Active codes not seen by the previous refresh, in list order.
    pub new_codes: Vec<String>,
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(value: RefreshOutcome) -> Self {
        let RefreshOutcome { payload, event } = value;
        Self {
            game: event.game,
            active: payload.active,
            inactive: payload.inactive,
            new_codes: event.new_codes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Games whose codes are tracked.
pub struct GamesResponse {
    pub games: Vec<GameId>,
}
