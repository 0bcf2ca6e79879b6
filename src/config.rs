//! Application-level configuration loading for the refresh pipeline and its collaborators.

use std::{env, fs, io::ErrorKind, num::NonZeroU32, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{remote::RetryPolicy, state::change_detector::FirstObservation};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GACHA_CODES_CONFIG_PATH";
/// Environment variable that overrides the remote source base URL.
const API_BASE_ENV: &str = "GACHA_CODES_API_BASE";

const DEFAULT_API_BASE: &str = "https://api.ennead.cc/mihoyo";
const DEFAULT_CODES_TTL_SECS: u32 = 15 * 60;
const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(60_000);
const DEFAULT_SQLITE_PATH: &str = "data/app.db";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Base URL of the remote code source (`<base>/<game>/codes`).
    pub api_base: String,
    /// Identifying `User-Agent` sent with every fetch.
    pub user_agent: String,
    /// Freshness window of cached codes payloads.
    pub codes_ttl: NonZeroU32,
    /// Period of the background refresh.
    pub refresh_interval: Duration,
    /// Retry budget, timeout and backoff of each fetch.
    pub retry: RetryPolicy,
    /// Whether a game's first refresh reports its codes as new.
    pub first_observation: FirstObservation,
    /// SQLite database file, created on first start.
    pub sqlite_path: PathBuf,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(api_base) = env::var(API_BASE_ENV).ok().filter(|v| !v.is_empty()) {
            config.api_base = api_base;
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    api_base: Option<String>,
    user_agent: Option<String>,
    codes_ttl_secs: Option<u32>,
    refresh_interval_ms: Option<u64>,
    fetch_retries: Option<u32>,
    fetch_timeout_ms: Option<u64>,
    fetch_backoff_base_ms: Option<u64>,
    first_observation: Option<FirstObservation>,
    sqlite_path: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = RetryPolicy::default();

        let codes_ttl = match value.codes_ttl_secs {
            Some(secs) => NonZeroU32::new(secs).unwrap_or_else(|| {
                warn!("codes_ttl_secs must be positive; using default");
                default_ttl()
            }),
            None => default_ttl(),
        };

        Self {
            api_base: value
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            user_agent: value.user_agent.unwrap_or_else(default_user_agent),
            codes_ttl,
            refresh_interval: positive_millis(
                value.refresh_interval_ms,
                DEFAULT_REFRESH_INTERVAL,
                "refresh_interval_ms",
            ),
            retry: RetryPolicy {
                retries: value.fetch_retries.unwrap_or(defaults.retries),
                timeout: positive_millis(
                    value.fetch_timeout_ms,
                    defaults.timeout,
                    "fetch_timeout_ms",
                ),
                backoff_base: value
                    .fetch_backoff_base_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.backoff_base),
            },
            first_observation: value.first_observation.unwrap_or_default(),
            sqlite_path: value
                .sqlite_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
        }
    }
}

fn default_ttl() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_CODES_TTL_SECS).unwrap_or(NonZeroU32::MIN)
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn positive_millis(value: Option<u64>, default: Duration, field: &'static str) -> Duration {
    match value {
        Some(0) => {
            warn!(field, "value must be positive; using default");
            default
        }
        Some(ms) => Duration::from_millis(ms),
        None => default,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
