//! Outbound access to the remote code source.

pub mod error;
/// Retrying JSON client.
pub mod fetcher;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::state::codes::{CodesPayload, GameId};

pub use self::error::{FetchError, FetchResult};
pub use self::fetcher::{ResilientFetcher, RetryPolicy};

/// Anything able to produce the current codes of a game.
pub trait CodesSource: Send + Sync {
    /// Fetch the raw (not yet normalized) codes payload of `game`.
    fn fetch_codes(&self, game: GameId) -> BoxFuture<'static, FetchResult<CodesPayload>>;
}

/// [`CodesSource`] reading `GET <base>/<game>/codes` through a [`ResilientFetcher`].
#[derive(Clone)]
pub struct RemoteCodesSource {
    fetcher: ResilientFetcher,
    base_url: Arc<str>,
}

impl RemoteCodesSource {
    /// Source rooted at `base_url`; a trailing slash is ignored.
    pub fn new(fetcher: ResilientFetcher, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    /// Endpoint serving the codes of `game`.
    pub fn url_for(&self, game: GameId) -> String {
        format!("{}/{}/codes", self.base_url, game)
    }
}

impl CodesSource for RemoteCodesSource {
    fn fetch_codes(&self, game: GameId) -> BoxFuture<'static, FetchResult<CodesPayload>> {
        let source = self.clone();
        Box::pin(async move {
            let url = source.url_for(game);
            let body = source.fetcher.fetch_json(&url).await?;
            CodesPayload::from_value(body).map_err(|source| FetchError::Shape { url, source })
        })
    }
}
