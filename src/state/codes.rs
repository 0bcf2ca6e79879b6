//! Domain model for tracked games and their promotional codes.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Closed set of games whose codes are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameId {
    /// Genshin Impact.
    Genshin,
    /// Honkai: Star Rail.
    Starrail,
    /// Honkai Impact 3rd.
    Honkai,
    /// Tears of Themis.
    Themis,
    /// Zenless Zone Zero.
    Zenless,
}

/// Raised when a string does not name one of the tracked games.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game `{0}`")]
pub struct UnknownGame(pub String);

impl GameId {
    /// Number of tracked games.
    pub const COUNT: usize = 5;

    /// Every tracked game, in a stable order.
    pub const ALL: [GameId; Self::COUNT] = [
        GameId::Genshin,
        GameId::Starrail,
        GameId::Honkai,
        GameId::Themis,
        GameId::Zenless,
    ];

    /// Identifier used in URLs and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            GameId::Genshin => "genshin",
            GameId::Starrail => "starrail",
            GameId::Honkai => "honkai",
            GameId::Themis => "themis",
            GameId::Zenless => "zenless",
        }
    }

    /// Cache key under which this game's codes payload is stored.
    pub fn cache_key(self) -> String {
        format!("{}/codes", self.as_str())
    }

    /// Dense index into per-game arenas.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameId {
    type Err = UnknownGame;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameId::ALL
            .into_iter()
            .find(|game| game.as_str() == value)
            .ok_or_else(|| UnknownGame(value.to_string()))
    }
}

/// A single promotional code and the rewards it grants. Identity is `code` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CodeItem {
    /// Code string as typed in game. Empty only before normalization.
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: String,
    /// Reward lines in publication order.
    #[serde(default, deserialize_with = "lenient_rewards")]
    pub rewards: Vec<String>,
}

impl CodeItem {
    /// Build an item from a code and its reward lines.
    pub fn new(code: impl Into<String>, rewards: Vec<String>) -> Self {
        Self {
            code: code.into(),
            rewards,
        }
    }
}

/// Active and inactive codes published for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CodesPayload {
    /// Codes that can still be redeemed.
    #[serde(default, deserialize_with = "lenient_items")]
    pub active: Vec<CodeItem>,
    /// Expired codes.
    #[serde(default, deserialize_with = "lenient_items")]
    pub inactive: Vec<CodeItem>,
}

impl CodesPayload {
    /// Decode a raw JSON body from the remote source.
    ///
    /// The body must be a JSON object; its lists are read leniently.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        if !value.is_object() {
            let found = match value {
                Value::Null => "null",
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                Value::String(_) => "a string",
                _ => "an array",
            };
            return Err(serde::de::Error::custom(format!(
                "expected a codes object, found {found}"
            )));
        }
        serde_json::from_value(value)
    }

    /// Resolve conflicts and duplicates so the payload upholds its invariants.
    ///
    /// Items without a code are dropped, duplicate codes collapse to their first
    /// occurrence, and a code listed as both active and inactive stays active only.
    /// Applying this twice yields the same result as applying it once.
    pub fn normalize(self) -> Self {
        let mut active: IndexMap<String, CodeItem> = IndexMap::new();
        for item in self.active {
            if item.code.is_empty() {
                continue;
            }
            active.entry(item.code.clone()).or_insert(item);
        }

        let mut inactive: IndexMap<String, CodeItem> = IndexMap::new();
        for item in self.inactive {
            if item.code.is_empty() || active.contains_key(&item.code) {
                continue;
            }
            inactive.entry(item.code.clone()).or_insert(item);
        }

        Self {
            active: active.into_values().collect(),
            inactive: inactive.into_values().collect(),
        }
    }

    /// Codes of the active list, in list order.
    pub fn active_codes(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(|item| item.code.as_str())
    }
}

/// A list that is `null` or not a list reads as empty. Entries that are not objects
/// become code-less items, which normalization drops.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<CodeItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            entry @ Value::Object(_) => serde_json::from_value(entry).unwrap_or_default(),
            _ => CodeItem::default(),
        })
        .collect())
}

fn lenient_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        other => text_of(other),
    })
}

/// Rewards arrive either as plain strings or as `{ "name": .. }` objects; anything
/// else is coerced to its JSON text.
fn lenient_rewards<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Value::Object(mut fields) => match fields.remove("name") {
                Some(Value::String(name)) => name,
                Some(other) => text_of(other),
                None => Value::Object(fields).to_string(),
            },
            other => text_of(other),
        })
        .collect())
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
