use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::UserPrefEntity,
    dto::{format_epoch_secs, validation::validate_pref_key},
};

/// Path segment naming a preference.
#[derive(Debug, Deserialize, Validate)]
pub struct PrefKeyPath {
    #[validate(custom(function = "validate_pref_key"))]
    pub key: String,
}

/// Body of a preference write: any JSON value.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct PrefValue(pub Value);

/// A stored preference. `value` is `null` when nothing was ever stored under `key`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PrefResponse {
    pub key: String,
    #[schema(value_type = Option<Object>)]
    pub value: Value,
    /// RFC 3339 timestamp of the last write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PrefResponse {
    pub fn unset(key: String) -> Self {
        Self {
            key,
            value: Value::Null,
            updated_at: None,
        }
    }
}

impl From<UserPrefEntity> for PrefResponse {
    fn from(entity: UserPrefEntity) -> Self {
        Self {
            key: entity.key,
            value: entity.value,
            updated_at: Some(format_epoch_secs(entity.updated_at)),
        }
    }
}
