use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::codes::{CodesResponse, GamesResponse, RefreshResponse},
    error::AppError,
    services::{codes_service, refresh_pipeline},
    state::{SharedState, codes::GameId},
};

/// Routes exposing the codes of each tracked game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/{game}/codes", get(list_codes))
        .route("/games/{game}/codes/refresh", post(refresh_codes))
}

/// List the tracked games.
#[utoipa::path(
    get,
    path = "/games",
    tag = "codes",
    responses((status = 200, description = "Tracked games", body = GamesResponse))
)]
pub async fn list_games() -> Json<GamesResponse> {
    Json(GamesResponse {
        games: GameId::ALL.to_vec(),
    })
}

/// Return the codes of a game, from the cache while it is fresh.
#[utoipa::path(
    get,
    path = "/games/{game}/codes",
    tag = "codes",
    params(("game" = String, Path, description = "Game identifier (genshin, starrail, honkai, themis, zenless)")),
    responses(
        (status = 200, description = "Codes of the game", body = CodesResponse),
        (status = 400, description = "Unknown game"),
        (status = 502, description = "Remote source unavailable")
    )
)]
pub async fn list_codes(
    State(state): State<SharedState>,
    Path(game): Path<String>,
) -> Result<Json<CodesResponse>, AppError> {
    let game: GameId = game.parse()?;
    let payload = codes_service::list_codes(&state, game).await?;
    Ok(Json(CodesResponse::new(game, payload)))
}

/// Fetch the codes of a game now and report the ones that just became active.
#[utoipa::path(
    post,
    path = "/games/{game}/codes/refresh",
    tag = "codes",
    params(("game" = String, Path, description = "Game identifier (genshin, starrail, honkai, themis, zenless)")),
    responses(
        (status = 200, description = "Refreshed codes", body = RefreshResponse),
        (status = 400, description = "Unknown game"),
        (status = 502, description = "Remote source unavailable")
    )
)]
pub async fn refresh_codes(
    State(state): State<SharedState>,
    Path(game): Path<String>,
) -> Result<Json<RefreshResponse>, AppError> {
    let game: GameId = game.parse()?;
    let outcome = refresh_pipeline::refresh_game(&state, game).await?;
    Ok(Json(outcome.into()))
}
