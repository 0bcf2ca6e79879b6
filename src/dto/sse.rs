use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{change_detector::ChangeEvent, codes::GameId};

/// SSE event name carrying a [`ChangeEvent`].
pub const NEW_CODES_EVENT: &str = "codes.new";
pub const HANDSHAKE_EVENT: &str = "handshake";

/// One named message of the codes stream, with its JSON body already encoded.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub data: String,
}

impl ServerEvent {
    pub fn handshake(handshake: &Handshake) -> serde_json::Result<Self> {
        Self::encode(HANDSHAKE_EVENT, handshake)
    }

    pub fn new_codes(change: &ChangeEvent) -> serde_json::Result<Self> {
        Self::encode(NEW_CODES_EVENT, change)
    }

    fn encode<T: Serialize>(name: &'static str, body: &T) -> serde_json::Result<Self> {
        Ok(Self {
            name,
            data: serde_json::to_string(body)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub message: String,
    /// Whether the backend is running without a storage backend.
    pub degraded: bool,
    /// Games whose codes are tracked by the background refresh.
    pub games: Vec<GameId>,
}
