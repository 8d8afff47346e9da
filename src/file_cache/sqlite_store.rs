use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use thiserror::Error;

use super::store::{CacheEntry, FileCacheStore};
use crate::{AssistantError, Result};

/// On-disk [`FileCacheStore`] backed by a single SQLite table.
///
/// Each operation opens its own connection on the blocking pool, so the
/// handle is cheap to clone and holds nothing open between calls.
#[derive(Clone, Debug)]
pub struct SqliteFileCacheStore {
    path: PathBuf,
}

#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("sqlite join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<SqliteStoreError> for AssistantError {
    fn from(err: SqliteStoreError) -> Self {
        AssistantError::Store(err.to_string())
    }
}

impl SqliteFileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the store and makes sure the schema exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        store.init().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn init(&self) -> Result<()> {
        self.run(|conn| {
            init_schema(conn)?;
            Ok(())
        })
        .await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> std::result::Result<T, SqliteStoreError>
            + Send
            + 'static,
    {
        let path = self.path.clone();
        let out = tokio::task::spawn_blocking(move || -> std::result::Result<T, SqliteStoreError> {
            let mut conn = open_connection(path)?;
            init_schema(&conn)?;
            op(&mut conn)
        })
        .await
        .map_err(SqliteStoreError::from)??;
        Ok(out)
    }
}

#[async_trait]
impl FileCacheStore for SqliteFileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let key = key.to_string();
        self.run(move |conn| {
            let entry = conn
                .query_row(
                    "SELECT key, content_hash, remote_file_id, updated_at_ms
                     FROM file_cache WHERE key=?1",
                    rusqlite::params![key],
                    row_to_entry,
                )
                .optional()?;
            Ok(entry)
        })
        .await
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO file_cache (key, content_hash, remote_file_id, updated_at_ms)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    content_hash=excluded.content_hash,
                    remote_file_id=excluded.remote_file_id,
                    updated_at_ms=excluded.updated_at_ms",
                rusqlite::params![
                    entry.key,
                    entry.content_hash,
                    entry.remote_file_id,
                    entry.updated_at_ms
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<Option<CacheEntry>> {
        let key = key.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let entry = tx
                .query_row(
                    "SELECT key, content_hash, remote_file_id, updated_at_ms
                     FROM file_cache WHERE key=?1",
                    rusqlite::params![key],
                    row_to_entry,
                )
                .optional()?;
            tx.execute(
                "DELETE FROM file_cache WHERE key=?1",
                rusqlite::params![key],
            )?;
            tx.commit()?;
            Ok(entry)
        })
        .await
    }

    async fn remove_by_file_id(&self, remote_file_id: &str) -> Result<Vec<CacheEntry>> {
        let remote_file_id = remote_file_id.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let removed = {
                let mut stmt = tx.prepare(
                    "SELECT key, content_hash, remote_file_id, updated_at_ms
                     FROM file_cache WHERE remote_file_id=?1 ORDER BY key",
                )?;
                let rows = stmt.query_map(rusqlite::params![remote_file_id], row_to_entry)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            };
            tx.execute(
                "DELETE FROM file_cache WHERE remote_file_id=?1",
                rusqlite::params![remote_file_id],
            )?;
            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key, content_hash, remote_file_id, updated_at_ms
                 FROM file_cache ORDER BY key",
            )?;
            let rows = stmt.query_map([], row_to_entry)?;
            let entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.run(|conn| {
            conn.execute("DELETE FROM file_cache", [])?;
            Ok(())
        })
        .await
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheEntry> {
    Ok(CacheEntry {
        key: row.get(0)?,
        content_hash: row.get(1)?,
        remote_file_id: row.get(2)?,
        updated_at_ms: row.get(3)?,
    })
}

fn init_schema(conn: &rusqlite::Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS file_cache (
            key TEXT PRIMARY KEY NOT NULL,
            content_hash TEXT NOT NULL,
            remote_file_id TEXT NOT NULL,
            updated_at_ms INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_file_cache_remote_file_id
            ON file_cache(remote_file_id);",
    )
}

fn open_connection(path: PathBuf) -> std::result::Result<rusqlite::Connection, rusqlite::Error> {
    let conn = rusqlite::Connection::open(path)?;
    let _ = conn.busy_timeout(Duration::from_secs(5));
    let _ = conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
    Ok(conn)
}
