//! Shared fixtures for unit tests: a scripted code source, failing storage and a
//! loopback HTTP server.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{Router, http::StatusCode};
use futures::future::{BoxFuture, FutureExt, ready};
use reqwest::Client;
use tokio::net::TcpListener;

use crate::{
    clock::ManualClock,
    config::AppConfig,
    dao::{
        codes_store::{CodesStore, MemoryCodesStore},
        models::{CacheEntryEntity, RedeemedCodeEntity, UserPrefEntity},
        storage::{StorageError, StorageResult},
    },
    remote::{CodesSource, FetchError, FetchResult},
    state::{
        AppState, SharedState,
        codes::{CodeItem, CodesPayload, GameId},
    },
};

/// Epoch second the manual test clock starts at.
pub const T0: i64 = 1_700_000_000;

/// Build a payload from bare code lists.
pub fn payload(active: &[&str], inactive: &[&str]) -> CodesPayload {
    let items = |codes: &[&str]| -> Vec<CodeItem> {
        codes
            .iter()
            .map(|code| CodeItem::new(*code, vec![format!("reward for {code}")]))
            .collect()
    };
    CodesPayload {
        active: items(active),
        inactive: items(inactive),
    }
}

/// [`CodesSource`] replaying queued replies per game. The last reply of a game is
/// repeated once its queue drains; `None` stands for a failed fetch.
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<GameId, VecDeque<Option<CodesPayload>>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful reply.
    pub fn push(&self, game: GameId, payload: CodesPayload) {
        self.queue(game, Some(payload));
    }

    /// Queue a failed fetch.
    pub fn push_failure(&self, game: GameId) {
        self.queue(game, None);
    }

    /// Number of fetches issued so far, all games included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queue(&self, game: GameId, reply: Option<CodesPayload>) {
        self.replies
            .lock()
            .unwrap()
            .entry(game)
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, game: GameId) -> Option<CodesPayload> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(&game)?;
        if queue.len() > 1 {
            queue.pop_front().flatten()
        } else {
            queue.front().cloned().flatten()
        }
    }
}

impl CodesSource for ScriptedSource {
    fn fetch_codes(&self, game: GameId) -> BoxFuture<'static, FetchResult<CodesPayload>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = format!("http://codes.test/{game}/codes");
        let reply = self.next_reply(game).ok_or_else(|| FetchError::Exhausted {
            url: url.clone(),
            attempts: 2,
            last: Box::new(FetchError::Status {
                url,
                status: StatusCode::SERVICE_UNAVAILABLE,
            }),
        });
        ready(reply).boxed()
    }
}

/// Store whose every operation fails as if the backend were gone.
pub struct UnavailableStore;

impl CodesStore for UnavailableStore {
    fn get_cache(&self, _key: &str) -> BoxFuture<'static, StorageResult<Option<CacheEntryEntity>>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn upsert_cache(&self, _entry: CacheEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn mark_redeemed(&self, _entry: RedeemedCodeEntity) -> BoxFuture<'static, StorageResult<()>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn is_redeemed(&self, _game: GameId, _code: &str) -> BoxFuture<'static, StorageResult<bool>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn list_redeemed(
        &self,
        _game: Option<GameId>,
    ) -> BoxFuture<'static, StorageResult<Vec<RedeemedCodeEntity>>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn get_pref(&self, _key: &str) -> BoxFuture<'static, StorageResult<Option<UserPrefEntity>>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn set_pref(&self, _entry: UserPrefEntity) -> BoxFuture<'static, StorageResult<()>> {
        ready(Err(StorageError::Detached)).boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(Err(StorageError::Detached)).boxed()
    }
}

/// State wired to `source`, a manual clock at [`T0`] and an in-memory store.
pub async fn test_state(
    config: &AppConfig,
    source: Arc<ScriptedSource>,
) -> (SharedState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let state = AppState::new(config, source, clock.clone());
    state.set_codes_store(Arc::new(MemoryCodesStore::new())).await;
    (state, clock)
}

/// HTTP client that never goes through a proxy, so loopback servers stay reachable.
pub fn http_client() -> Client {
    Client::builder()
        .no_proxy()
        .user_agent("codes-test/1.0")
        .build()
        .expect("build test client")
}

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}
