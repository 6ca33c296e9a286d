//! SQLite response cache implementation.

use crate::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// File name of the cache database inside the cache directory.
pub const CACHE_FILE: &str = "responses.db";

/// Identifies one cached completion: which backend answered, and the exact
/// request it answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    backend: String,
    request: String,
}

impl CacheKey {
    /// Build a key from a backend identity and a serializable request.
    ///
    /// The request is rendered as JSON; struct fields serialize in
    /// declaration order, so equal requests give equal keys.
    pub fn new(backend: impl Into<String>, request: &impl Serialize) -> Result<Self> {
        Ok(Self {
            backend: backend.into(),
            request: serde_json::to_string(request)?,
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }
}

/// A response read back from the cache.
#[derive(Debug, Clone)]
pub struct CachedResponse<T> {
    pub response: T,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed store of completed model responses.
pub struct ResponseCache {
    conn: Connection,
}

impl ResponseCache {
    /// Open or create the cache database in `dir`, creating the directory
    /// when needed.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Self::open(dir.join(CACHE_FILE))
    }

    /// Open or create a cache database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                backend TEXT NOT NULL,
                request TEXT NOT NULL,
                created_at TEXT NOT NULL,
                response TEXT NOT NULL,
                PRIMARY KEY (backend, request)
            );
            "#,
        )?;
        Ok(())
    }

    /// Look up a response. Rows that no longer deserialize are treated as
    /// misses.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<CachedResponse<T>>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT response, created_at FROM responses WHERE backend = ?1 AND request = ?2",
                params![key.backend, key.request],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((response, created_at)) = row else {
            return Ok(None);
        };

        let (Ok(response), Ok(created_at)) = (
            serde_json::from_str(&response),
            created_at.parse::<DateTime<Utc>>(),
        ) else {
            debug!(backend = %key.backend, "ignoring unreadable cache entry");
            return Ok(None);
        };

        Ok(Some(CachedResponse {
            response,
            created_at,
        }))
    }

    /// Store a response, replacing any previous one for the same key.
    pub fn put<T: Serialize>(&self, key: &CacheKey, response: &T) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO responses (backend, request, created_at, response)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key.backend,
                key.request,
                Utc::now().to_rfc3339(),
                serde_json::to_string(response)?,
            ],
        )?;
        Ok(())
    }

    /// Number of cached responses.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every cached response, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM responses", [])?)
    }
}

/// Empty the cache in `dir` without creating anything that is not already
/// there. Returns the number of removed responses.
pub fn clear_dir(dir: impl AsRef<Path>) -> Result<usize> {
    let path = dir.as_ref().join(CACHE_FILE);
    if !path.exists() {
        return Ok(0);
    }
    ResponseCache::open(path)?.clear()
}
