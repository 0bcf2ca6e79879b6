//! Gacha codes backend entrypoint wiring the remote source, storage, scheduler and HTTP layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use futures::future::BoxFuture;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gacha_codes_back::{
    clock::SystemClock,
    config::AppConfig,
    dao::{codes_store::CodesStore, storage::StorageError},
    remote::{RemoteCodesSource, ResilientFetcher},
    routes,
    services::{scheduler, storage_supervisor},
    state::{AppState, SharedState},
};

/// Pending attempt to open the durable store.
type StoreOpening = BoxFuture<'static, Result<Arc<dyn CodesStore>, StorageError>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let fetcher = ResilientFetcher::new(&config.user_agent, config.retry)
        .context("building HTTP client")?;
    let source = RemoteCodesSource::new(fetcher, &config.api_base);
    info!(api_base = %config.api_base, "using remote code source");

    let app_state = AppState::new(&config, Arc::new(source), Arc::new(SystemClock));

    tokio::spawn(storage_supervisor::run(
        app_state.clone(),
        store_connector(&config),
    ));
    scheduler::start_codes_scheduler(&app_state, app_state.refresh_interval()).await;

    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    scheduler::stop_codes_scheduler(&app_state).await;
    Ok(())
}

/// Build the closure the storage supervisor calls to (re)open the durable store.
#[cfg(feature = "sqlite-store")]
fn store_connector(config: &AppConfig) -> impl FnMut() -> StoreOpening + Send + 'static {
    use futures::FutureExt;
    use gacha_codes_back::dao::codes_store::sqlite::{SqliteCodesStore, SqliteConfig};

    let path = config.sqlite_path.clone();
    move || {
        let sqlite = SqliteConfig::new(path.clone());
        async move {
            let store = SqliteCodesStore::open(sqlite).await?;
            info!("opened SQLite codes store");
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn CodesStore>)
        }
        .boxed()
    }
}

/// Without a durable backend the cache and ledger live in process memory.
#[cfg(not(feature = "sqlite-store"))]
fn store_connector(_config: &AppConfig) -> impl FnMut() -> StoreOpening + Send + 'static {
    use futures::{FutureExt, future::ready};
    use gacha_codes_back::dao::codes_store::MemoryCodesStore;

    let store: Arc<dyn CodesStore> = Arc::new(MemoryCodesStore::new());
    move || ready(Ok(store.clone())).boxed()
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
