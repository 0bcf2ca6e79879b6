use std::{
    fs,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::dao::{
    codes_store::CodesStore,
    models::{CacheEntryEntity, RedeemedCodeEntity, UserPrefEntity},
    storage::StorageResult,
};
use crate::state::codes::GameId;

use super::{
    config::SqliteConfig,
    error::{SqliteDaoError, SqliteResult},
};

const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
  version INTEGER PRIMARY KEY,
  applied_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS cache_entries (
  key TEXT PRIMARY KEY,
  payload_json TEXT NOT NULL,
  fetched_at INTEGER NOT NULL,
  ttl_seconds INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS redeemed_codes (
  game TEXT NOT NULL,
  code TEXT NOT NULL,
  redeemed_at INTEGER NOT NULL,
  reward_json TEXT,
  source TEXT,
  PRIMARY KEY (game, code)
);
CREATE INDEX IF NOT EXISTS idx_redeemed_game ON redeemed_codes(game);
CREATE TABLE IF NOT EXISTS user_prefs (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version(version, applied_at)
VALUES (1, strftime('%s','now'));
";

/// SQLite-backed store. Statements run on the blocking pool, one at a time per handle.
#[derive(Clone)]
pub struct SqliteCodesStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCodesStore {
    /// Open (or create) the database and apply the schema.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = tokio::task::spawn_blocking(move || open_connection(&config))
            .await
            .map_err(|source| SqliteDaoError::Worker { source })??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| SqliteDaoError::Poisoned)?;
            op(&guard)
        })
        .await
        .map_err(|source| SqliteDaoError::Worker { source })?
    }
}

fn open_connection(config: &SqliteConfig) -> SqliteResult<Connection> {
    if !config.is_in_memory() {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SqliteDaoError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let conn = Connection::open(&config.path).map_err(|source| SqliteDaoError::Open {
        path: config.path.clone(),
        source,
    })?;

    let _mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(|source| SqliteDaoError::Migrate { source })?;
    conn.execute_batch(MIGRATION_SQL)
        .map_err(|source| SqliteDaoError::Migrate { source })?;

    info!(path = %config.path.display(), "SQLite store ready");
    Ok(conn)
}

fn query_err(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> SqliteDaoError {
    move |source| SqliteDaoError::Query { operation, source }
}

impl CodesStore for SqliteCodesStore {
    fn get_cache(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<CacheEntryEntity>>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move {
            let entry = store
                .with_conn(move |conn| {
                    let row = conn
                        .query_row(
                            "SELECT payload_json, fetched_at, ttl_seconds FROM cache_entries WHERE key = ?1",
                            params![key],
                            |row| {
                                Ok((
                                    row.get::<_, String>(0)?,
                                    row.get::<_, i64>(1)?,
                                    row.get::<_, u32>(2)?,
                                ))
                            },
                        )
                        .optional()
                        .map_err(query_err("get_cache"))?;

                    let Some((payload_json, fetched_at, ttl_seconds)) = row else {
                        return Ok(None);
                    };
                    let payload = serde_json::from_str(&payload_json).map_err(|source| {
                        SqliteDaoError::Decode {
                            key: key.clone(),
                            source,
                        }
                    })?;

                    Ok(Some(CacheEntryEntity {
                        key,
                        payload,
                        fetched_at,
                        ttl_seconds,
                    }))
                })
                .await?;
            Ok(entry)
        })
    }

    fn upsert_cache(&self, entry: CacheEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .with_conn(move |conn| {
                    let payload_json =
                        serde_json::to_string(&entry.payload).map_err(|source| {
                            SqliteDaoError::Encode {
                                key: entry.key.clone(),
                                source,
                            }
                        })?;
                    conn.execute(
                        "INSERT INTO cache_entries(key, payload_json, fetched_at, ttl_seconds)
                         VALUES(?1, ?2, ?3, ?4)
                         ON CONFLICT(key) DO UPDATE SET
                           payload_json = excluded.payload_json,
                           fetched_at = excluded.fetched_at,
                           ttl_seconds = excluded.ttl_seconds",
                        params![entry.key, payload_json, entry.fetched_at, entry.ttl_seconds],
                    )
                    .map_err(query_err("upsert_cache"))?;
                    Ok(())
                })
                .await
                .map_err(Into::into)
        })
    }

    fn mark_redeemed(&self, entry: RedeemedCodeEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .with_conn(move |conn| {
                    conn.execute(
                        "INSERT OR IGNORE INTO redeemed_codes(game, code, redeemed_at, reward_json, source)
                         VALUES(?1, ?2, ?3, ?4, ?5)",
                        params![
                            entry.game.as_str(),
                            entry.code,
                            entry.redeemed_at,
                            entry.reward_json,
                            entry.source
                        ],
                    )
                    .map_err(query_err("mark_redeemed"))?;
                    Ok(())
                })
                .await
                .map_err(Into::into)
        })
    }

    fn is_redeemed(&self, game: GameId, code: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let code = code.to_string();
        Box::pin(async move {
            store
                .with_conn(move |conn| {
                    let hit = conn
                        .query_row(
                            "SELECT 1 FROM redeemed_codes WHERE game = ?1 AND code = ?2 LIMIT 1",
                            params![game.as_str(), code],
                            |_| Ok(()),
                        )
                        .optional()
                        .map_err(query_err("is_redeemed"))?;
                    Ok(hit.is_some())
                })
                .await
                .map_err(Into::into)
        })
    }

    fn list_redeemed(
        &self,
        game: Option<GameId>,
    ) -> BoxFuture<'static, StorageResult<Vec<RedeemedCodeEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .with_conn(move |conn| {
                    let mut statement = conn
                        .prepare(
                            "SELECT game, code, redeemed_at, reward_json, source FROM redeemed_codes
                             WHERE (?1 IS NULL OR game = ?1)
                             ORDER BY redeemed_at DESC",
                        )
                        .map_err(query_err("list_redeemed"))?;
                    let rows = statement
                        .query_map(params![game.map(GameId::as_str)], |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, i64>(2)?,
                                row.get::<_, Option<String>>(3)?,
                                row.get::<_, Option<String>>(4)?,
                            ))
                        })
                        .map_err(query_err("list_redeemed"))?
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(query_err("list_redeemed"))?;

                    rows.into_iter()
                        .map(|(game, code, redeemed_at, reward_json, source)| -> SqliteResult<_> {
                            let game = game
                                .parse::<GameId>()
                                .map_err(|err| SqliteDaoError::UnknownGame { value: err.0 })?;
                            Ok(RedeemedCodeEntity {
                                game,
                                code,
                                redeemed_at,
                                reward_json,
                                source,
                            })
                        })
                        .collect()
                })
                .await
                .map_err(Into::into)
        })
    }

    fn get_pref(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<UserPrefEntity>>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move {
            store
                .with_conn(move |conn| {
                    let row = conn
                        .query_row(
                            "SELECT value, updated_at FROM user_prefs WHERE key = ?1",
                            params![key],
                            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                        )
                        .optional()
                        .map_err(query_err("get_pref"))?;

                    let Some((value_json, updated_at)) = row else {
                        return Ok(None);
                    };
                    let value = serde_json::from_str(&value_json).map_err(|source| {
                        SqliteDaoError::Decode {
                            key: key.clone(),
                            source,
                        }
                    })?;
                    Ok(Some(UserPrefEntity {
                        key,
                        value,
                        updated_at,
                    }))
                })
                .await
                .map_err(Into::into)
        })
    }

    fn set_pref(&self, entry: UserPrefEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .with_conn(move |conn| {
                    let value_json = serde_json::to_string(&entry.value).map_err(|source| {
                        SqliteDaoError::Encode {
                            key: entry.key.clone(),
                            source,
                        }
                    })?;
                    conn.execute(
                        "INSERT INTO user_prefs(key, value, updated_at)
                         VALUES(?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET
                           value = excluded.value,
                           updated_at = excluded.updated_at",
                        params![entry.key, value_json, entry.updated_at],
                    )
                    .map_err(query_err("set_pref"))?;
                    Ok(())
                })
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .with_conn(|conn| {
                    conn.query_row("SELECT 1", [], |_| Ok(()))
                        .map_err(query_err("health_check"))
                })
                .await
                .map_err(Into::into)
        })
    }
}
