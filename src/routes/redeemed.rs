use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::redeemed::{
        RedeemCodeRequest, RedeemedCodeResponse, RedeemedQuery, RedeemedStatusResponse,
    },
    error::AppError,
    services::redeemed_service,
    state::{SharedState, codes::GameId},
};

/// Routes managing the ledger of redeemed codes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/redeemed", get(list_redeemed))
        .route("/games/{game}/redeemed", post(mark_redeemed))
        .route("/games/{game}/redeemed/{code}", get(redeemed_status))
}

/// List redeemed codes, newest first.
#[utoipa::path(
    get,
    path = "/redeemed",
    tag = "redeemed",
    params(RedeemedQuery),
    responses(
        (status = 200, description = "Redeemed codes", body = [RedeemedCodeResponse]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_redeemed(
    State(state): State<SharedState>,
    Query(query): Query<RedeemedQuery>,
) -> Result<Json<Vec<RedeemedCodeResponse>>, AppError> {
    let rows = redeemed_service::list_redeemed(&state, query.game).await?;
    Ok(Json(rows))
}

/// Record a code as redeemed for a game.
#[utoipa::path(
    post,
    path = "/games/{game}/redeemed",
    tag = "redeemed",
    params(("game" = String, Path, description = "Game identifier")),
    request_body = RedeemCodeRequest,
    responses(
        (status = 200, description = "Stored redemption", body = RedeemedCodeResponse),
        (status = 400, description = "Unknown game or invalid code"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn mark_redeemed(
    State(state): State<SharedState>,
    Path(game): Path<String>,
    Valid(Json(request)): Valid<Json<RedeemCodeRequest>>,
) -> Result<Json<RedeemedCodeResponse>, AppError> {
    let game: GameId = game.parse()?;
    let stored = redeemed_service::mark_redeemed(&state, game, request).await?;
    Ok(Json(stored))
}

/// Tell whether a code has been redeemed for a game.
#[utoipa::path(
    get,
    path = "/games/{game}/redeemed/{code}",
    tag = "redeemed",
    params(
        ("game" = String, Path, description = "Game identifier"),
        ("code" = String, Path, description = "Code to look up")
    ),
    responses(
        (status = 200, description = "Redemption status", body = RedeemedStatusResponse),
        (status = 400, description = "Unknown game"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn redeemed_status(
    State(state): State<SharedState>,
    Path((game, code)): Path<(String, String)>,
) -> Result<Json<RedeemedStatusResponse>, AppError> {
    let game: GameId = game.parse()?;
    let status = redeemed_service::redeemed_status(&state, game, code).await?;
    Ok(Json(status))
}
