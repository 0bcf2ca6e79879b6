use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the codes backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::codes_stream,
        crate::routes::codes::list_games,
        crate::routes::codes::list_codes,
        crate::routes::codes::refresh_codes,
        crate::routes::redeemed::list_redeemed,
        crate::routes::redeemed::mark_redeemed,
        crate::routes::redeemed::redeemed_status,
        crate::routes::prefs::get_pref,
        crate::routes::prefs::set_pref,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::sse::Handshake,
            crate::dto::codes::GamesResponse,
            crate::dto::codes::CodesResponse,
            crate::dto::codes::RefreshResponse,
            crate::dto::redeemed::RedeemCodeRequest,
            crate::dto::redeemed::RedeemedCodeResponse,
            crate::dto::redeemed::RedeemedStatusResponse,
            crate::dto::prefs::PrefResponse,
            crate::dto::prefs::PrefValue,
            crate::state::change_detector::ChangeEvent,
            crate::state::codes::CodeItem,
            crate::state::codes::GameId,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "codes", description = "Promotional codes per game"),
        (name = "redeemed", description = "Ledger of redeemed codes"),
        (name = "prefs", description = "User preferences"),
    )
)]
pub struct ApiDoc;
