//! SQLite-backed persistent store.
//!
//! Values are JSON-encoded into a single `kv_entries` table. Expiry is
//! enforced lazily: `get` ignores rows whose `expires_at` has passed and
//! [`SqliteStore::purge_expired`] deletes them.

mod connection;
pub mod migrations;

use std::marker::PhantomData;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_rusqlite::{Connection, params, rusqlite};

use super::{CacheOptions, Error, KeyValueStore};

/// Persistent store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the connection.
#[derive(Debug)]
pub struct SqliteStore<V> {
    conn: Connection,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for SqliteStore<V> {
    fn clone(&self) -> Self {
        Self { conn: self.conn.clone(), _value: PhantomData }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<V> SqliteStore<V> {
    /// Open (or create) a store at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = connection::open(path).await?;
        Ok(Self { conn, _value: PhantomData })
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = connection::open_in_memory().await?;
        Ok(Self { conn, _value: PhantomData })
    }

    /// Delete every entry whose TTL has elapsed. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<usize, Error> {
        let now = timestamp(Utc::now());
        let removed = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let removed = conn.execute(
                    "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(removed)
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(removed, "purged expired store entries");
        Ok(removed)
    }

    /// Total number of rows, expired or not.
    pub async fn count(&self) -> Result<usize, Error> {
        self.conn
            .call(|conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl<V> KeyValueStore<V, CacheOptions> for SqliteStore<V>
where
    V: Serialize + DeserializeOwned + Send + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        let key = key.to_string();
        let now = timestamp(Utc::now());
        let json = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT value FROM kv_entries
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                )?;

                match stmt.query_row(params![key, now], |row| row.get(0)) {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        json.map(|json| serde_json::from_str(&json).map_err(|e| Error::Store(format!("corrupt entry: {}", e))))
            .transpose()
    }

    async fn set(&self, key: &str, value: V, options: CacheOptions) -> Result<(), Error> {
        let json = serde_json::to_string(&value).map_err(|e| Error::Store(format!("cannot encode entry: {}", e)))?;
        let key = key.to_string();
        let stored_at = Utc::now();
        let expires_at = options
            .ttl
            .and_then(|ttl| i64::try_from(ttl).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| stored_at.checked_add_signed(ttl))
            .map(timestamp);
        let stored_at = timestamp(stored_at);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_entries (key, value, stored_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, json, stored_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
