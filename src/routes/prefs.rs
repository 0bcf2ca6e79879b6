use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::prefs::{PrefKeyPath, PrefResponse, PrefValue},
    error::AppError,
    services::prefs_service,
    state::SharedState,
};

/// Routes reading and writing user preferences.
pub fn router() -> Router<SharedState> {
    Router::new().route("/prefs/{key}", get(get_pref).put(set_pref))
}

/// Read a preference; a key never written reads as `null`.
#[utoipa::path(
    get,
    path = "/prefs/{key}",
    tag = "prefs",
    params(("key" = String, Path, description = "Preference key")),
    responses(
        (status = 200, description = "Stored preference", body = PrefResponse),
        (status = 400, description = "Invalid key"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_pref(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PrefKeyPath>>,
) -> Result<Json<PrefResponse>, AppError> {
    Ok(Json(prefs_service::get_pref(&state, path.key).await?))
}

/// Store any JSON value under a preference key.
#[utoipa::path(
    put,
    path = "/prefs/{key}",
    tag = "prefs",
    params(("key" = String, Path, description = "Preference key")),
    request_body = PrefValue,
    responses(
        (status = 200, description = "Stored preference", body = PrefResponse),
        (status = 400, description = "Invalid key"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn set_pref(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PrefKeyPath>>,
    Json(PrefValue(value)): Json<PrefValue>,
) -> Result<Json<PrefResponse>, AppError> {
    Ok(Json(prefs_service::set_pref(&state, path.key, value).await?))
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        config::AppConfig,
        routes,
        test_support::{ScriptedSource, http_client, serve, test_state},
    };

    #[tokio::test]
    async fn put_then_get_a_preference() {
        let (state, _clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;
        let base = serve(routes::router(state)).await;
        let client = http_client();

        let unset: Value = client
            .get(format!("{base}/prefs/ui.theme"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(unset["value"], Value::Null);

        let stored: Value = client
            .put(format!("{base}/prefs/ui.theme"))
            .json(&json!({ "mode": "dark" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stored["value"]["mode"], "dark");

        let read: Value = client
            .get(format!("{base}/prefs/ui.theme"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(read["value"]["mode"], "dark");
        assert!(read["updated_at"].is_string());
    }

    #[tokio::test]
    async fn invalid_key_is_rejected() {
        let (state, _clock) = test_state(&AppConfig::default(), ScriptedSource::new()).await;
        let base = serve(routes::router(state)).await;

        let response = http_client()
            .put(format!("{base}/prefs/bad%20key"))
            .json(&json!(true))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
