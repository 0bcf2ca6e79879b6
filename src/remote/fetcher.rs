use std::{future::Future, time::Duration};

use reqwest::Client;
use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::warn;

use super::error::{FetchError, FetchResult};

const DEFAULT_RETRIES: u32 = 1;
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(300);

/// Bounds applied to one fetch: extra attempts, per-attempt timeout and linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub retries: u32,
    /// Limit for one attempt, connection through body.
    pub timeout: Duration,
    /// Sleep after the first failure; the n-th failure sleeps n times this.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after the failed attempt number `attempt` (1-based), saturating at
    /// [`Duration::MAX`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

/// Run `attempt` until it succeeds or `policy.retries + 1` attempts have failed, sleeping
/// `backoff_base * n` after the n-th failure. Each call starts a fresh budget.
pub async fn retry_with_backoff<T, A, AFut, S, SFut>(
    policy: &RetryPolicy,
    url: &str,
    mut attempt: A,
    mut pause: S,
) -> FetchResult<T>
where
    A: FnMut(u32) -> AFut,
    AFut: Future<Output = FetchResult<T>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let total = policy.retries.saturating_add(1);
    let mut number = 1;

    loop {
        match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(err) if number < total => {
                let delay = policy.backoff(number);
                warn!(url, attempt = number, ?delay, error = %err, "fetch attempt failed; retrying");
                pause(delay).await;
                number += 1;
            }
            Err(err) => {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: number,
                    last: Box::new(err),
                });
            }
        }
    }
}

/// HTTP JSON client with bounded retries and per-attempt timeouts.
#[derive(Clone)]
pub struct ResilientFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl ResilientFetcher {
    /// Build a fetcher sending `user_agent` on every request.
    pub fn new(user_agent: &str, policy: RetryPolicy) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|source| FetchError::ClientBuilder { source })?;
        Ok(Self::with_client(client, policy))
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// GET `url` and decode its JSON body under the default policy.
    pub async fn fetch_json(&self, url: &str) -> FetchResult<Value> {
        self.fetch_json_with(url, self.policy).await
    }

    /// GET `url` and decode its JSON body under an explicit policy.
    pub async fn fetch_json_with(&self, url: &str, policy: RetryPolicy) -> FetchResult<Value> {
        retry_with_backoff(&policy, url, |_| self.attempt(url, policy.timeout), sleep).await
    }

    async fn attempt(&self, url: &str, limit: Duration) -> FetchResult<Value> {
        match timeout(limit, self.get_json(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: limit,
            }),
        }
    }

    async fn get_json(&self, url: &str) -> FetchResult<Value> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| FetchError::Request {
                    url: url.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| FetchError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode, header::USER_AGENT},
        response::IntoResponse,
        routing::get,
    };
    use futures::future::ready;
    use serde_json::json;

    use super::*;
    use crate::test_support::{http_client, serve};

    fn unavailable() -> FetchError {
        FetchError::Status {
            url: "http://codes.test/zenless/codes".into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            timeout: Duration::from_secs(2),
            backoff_base: Duration::from_millis(10),
        }
    }

    #[test]
    fn backoff_grows_linearly_and_saturates() {
        let policy = fast_policy(3);
        assert_eq!(policy.backoff(2), policy.backoff_base * 2);

        let huge = RetryPolicy {
            backoff_base: Duration::from_secs(u64::MAX / 2),
            ..RetryPolicy::default()
        };
        assert_eq!(huge.backoff(3), Duration::MAX);
    }

    #[tokio::test]
    async fn succeeds_after_two_failures_with_two_backoff_sleeps() {
        let mut calls = 0;
        let mut sleeps = Vec::new();
        let policy = RetryPolicy {
            retries: 2,
            ..RetryPolicy::default()
        };

        let result = retry_with_backoff(
            &policy,
            "http://codes.test",
            |_| {
                calls += 1;
                ready(if calls <= 2 { Err(unavailable()) } else { Ok("codes") })
            },
            |delay| {
                sleeps.push(delay);
                ready(())
            },
        )
        .await;

        assert_eq!(result.unwrap(), "codes");
        assert_eq!(calls, 3);
        assert_eq!(
            sleeps,
            [Duration::from_millis(300), Duration::from_millis(600)]
        );
    }

    #[tokio::test]
    async fn exhausts_after_retries_plus_one_attempts() {
        let mut calls = 0;
        let mut sleeps = 0;
        let policy = RetryPolicy {
            retries: 3,
            ..RetryPolicy::default()
        };

        let err = retry_with_backoff(
            &policy,
            "http://codes.test",
            |n| {
                calls += 1;
                ready(Err::<(), _>(FetchError::Timeout {
                    url: format!("attempt-{n}"),
                    timeout: Duration::from_millis(1),
                }))
            },
            |_| {
                sleeps += 1;
                ready(())
            },
        )
        .await
        .unwrap_err();

        assert_eq!(calls, 4);
        assert_eq!(sleeps, 3);
        match err {
            FetchError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::Timeout { ref url, .. } if url == "attempt-4"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_retries_means_a_single_attempt() {
        let mut sleeps = 0;
        let err = retry_with_backoff(
            &fast_policy(0),
            "http://codes.test",
            |_| ready(Err::<(), _>(unavailable())),
            |_| {
                sleeps += 1;
                ready(())
            },
        )
        .await
        .unwrap_err();

        assert_eq!(sleeps, 0);
        assert!(matches!(err, FetchError::Exhausted { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn fetches_json_after_transient_http_errors() {
        let hits = Arc::new(AtomicU32::new(0));
        let router = Router::new().route(
            "/zenless/codes",
            get({
                let hits = hits.clone();
                move |headers: HeaderMap| {
                    let hits = hits.clone();
                    async move {
                        let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                        let agent = headers
                            .get(USER_AGENT)
                            .and_then(|value| value.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        if n <= 2 {
                            (StatusCode::BAD_GATEWAY, "try later").into_response()
                        } else {
                            Json(json!({ "active": [{ "code": "A" }], "agent": agent }))
                                .into_response()
                        }
                    }
                }
            }),
        );
        let base = serve(router).await;

        let fetcher = ResilientFetcher::with_client(http_client(), fast_policy(2));
        let body = fetcher
            .fetch_json(&format!("{base}/zenless/codes"))
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(body["active"][0]["code"], "A");
        assert_eq!(body["agent"], "codes-test/1.0");
    }

    #[tokio::test]
    async fn non_json_body_is_a_failure() {
        let router = Router::new().route("/genshin/codes", get(|| async { "<html>nope</html>" }));
        let base = serve(router).await;

        let fetcher = ResilientFetcher::with_client(http_client(), fast_policy(1));
        let err = fetcher
            .fetch_json(&format!("{base}/genshin/codes"))
            .await
            .unwrap_err();

        match err {
            FetchError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, FetchError::Decode { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let router = Router::new().route(
            "/honkai/codes",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!({ "active": [] }))
            }),
        );
        let base = serve(router).await;

        let fetcher = ResilientFetcher::with_client(http_client(), fast_policy(0));
        let policy = RetryPolicy {
            timeout: Duration::from_millis(50),
            ..fast_policy(0)
        };
        let err = fetcher
            .fetch_json_with(&format!("{base}/honkai/codes"), policy)
            .await
            .unwrap_err();

        match err {
            FetchError::Exhausted { last, .. } => {
                assert!(matches!(*last, FetchError::Timeout { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
