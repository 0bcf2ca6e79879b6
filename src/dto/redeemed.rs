use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::RedeemedCodeEntity,
    dto::{format_epoch_secs, validation::validate_code},
    state::codes::GameId,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Payload used to record a redeemed code.
pub struct RedeemCodeRequest {
    #[validate(custom(function = "validate_code"))]
    pub code: String,
    /// Reward lines granted by the code, if known.
    #[serde(default)]
    pub rewards: Vec<String>,
    /// Free-form origin of the redemption (`manual`, `auto`, ...).
    #[validate(length(min = 1, max = 32))]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
/// Optional filter of the redeemed codes listing.
pub struct RedeemedQuery {
    pub game: Option<GameId>,
}

#[derive(Debug, Serialize, ToSchema)]
/// A code recorded as redeemed.
pub struct RedeemedCodeResponse {
    pub game: GameId,
    pub code: String,
    /// RFC 3339 timestamp of the first redemption.
    pub redeemed_at: String,
    pub rewards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<RedeemedCodeEntity> for RedeemedCodeResponse {
    fn from(value: RedeemedCodeEntity) -> Self {
        let rewards = value
            .reward_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Self {
            game: value.game,
            code: value.code,
            redeemed_at: format_epoch_secs(value.redeemed_at),
            rewards,
            source: value.source,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Whether a code has already been redeemed for a game.
pub struct RedeemedStatusResponse {
    pub game: GameId,
    pub code: String,
    pub redeemed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_whitespace_codes() {
        let request = RedeemCodeRequest {
            code: "BAD CODE".into(),
            rewards: Vec::new(),
            source: None,
        };
        assert!(request.validate().is_err());

        let request = RedeemCodeRequest {
            code: "GOODCODE".into(),
            rewards: vec!["Primogem x60".into()],
            source: Some("manual".into()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn response_decodes_stored_rewards() {
        let response = RedeemedCodeResponse::from(RedeemedCodeEntity {
            game: GameId::Genshin,
            code: "GENSHINGIFT".into(),
            redeemed_at: 0,
            reward_json: Some(r#"["Primogem x50","Hero's Wit x3"]"#.into()),
            source: None,
        });
        assert_eq!(response.rewards, ["Primogem x50", "Hero's Wit x3"]);
        assert_eq!(response.redeemed_at, "1970-01-01T00:00:00Z");

        let response = RedeemedCodeResponse::from(RedeemedCodeEntity {
            game: GameId::Genshin,
            code: "OTHER".into(),
            redeemed_at: 0,
            reward_json: Some("not json".into()),
            source: None,
        });
        assert!(response.rewards.is_empty());
    }
}
