//! Failures raised while fetching JSON from the remote code source.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`FetchError`] failures.
pub type FetchResult<T> = Result<T, FetchError>;

/// Failures that can occur while talking to the remote code source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        /// Transport-level cause.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or the connection dropped.
    #[error("request to `{url}` failed")]
    Request {
        /// Requested URL.
        url: String,
        /// Transport-level cause.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("unexpected status {status} from `{url}`")]
    Status {
        /// Requested URL.
        url: String,
        /// Status the server answered with.
        status: StatusCode,
    },
    /// The attempt did not complete within its time budget.
    #[error("request to `{url}` timed out after {timeout:?}")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Per-attempt limit that elapsed.
        timeout: Duration,
    },
    /// The body was not valid JSON.
    #[error("malformed JSON body from `{url}`")]
    Decode {
        /// Requested URL.
        url: String,
        /// Transport-level cause.
        #[source]
        source: reqwest::Error,
    },
    /// The JSON body does not have the expected `{ active, inactive }` shape.
    #[error("unexpected payload shape from `{url}`")]
    Shape {
        /// Requested URL.
        url: String,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Every allowed attempt failed; carries the cause of the last one.
    #[error("giving up on `{url}` after {attempts} attempt(s): {last}")]
    Exhausted {
        /// Requested URL.
        url: String,
        /// Attempts made, the first one included.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last: Box<FetchError>,
    },
}
