use std::error::Error as StdError;

use thiserror::Error;

/// Result alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BackendError = Box<dyn StdError + Send + Sync>;

/// Failure of the durable store behind the codes cache and the redeemed ledger.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend is installed but the operation failed.
    #[error("{backend} storage unavailable: {source}")]
    Unavailable {
        /// Backend name, such as `sqlite`.
        backend: &'static str,
        /// Backend-specific cause.
        #[source]
        source: BackendError,
    },
    /// No backend is installed (degraded mode).
    #[error("storage detached (degraded mode)")]
    Detached,
}

impl StorageError {
    /// Wrap a failure raised by the named backend.
    pub fn backend(backend: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            backend,
            source: Box::new(source),
        }
    }
}
