//! Key-value store capability used by the cache layer.
//!
//! The cache layer only ever talks to a [`KeyValueStore`]; eviction,
//! persistence and TTL enforcement belong to the backend. Backends:
//!
//! - [`NoopStore`]: never retains anything
//! - [`MemoryStore`]: process-local map with per-entry expiry
//! - [`SqliteStore`]: persistent entries via tokio-rusqlite (WAL mode)
//!
//! [`Namespaced`] wraps any of them and prefixes every key so a single
//! backend can be shared with unrelated cache users.

pub mod memory;
pub mod namespaced;
pub mod noop;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::Error;

pub use memory::MemoryStore;
pub use namespaced::Namespaced;
pub use noop::NoopStore;
pub use sqlite::SqliteStore;

/// Per-entry store options.
///
/// `ttl` is the only option the cache layer itself interprets; everything
/// else is carried verbatim in `extra` for backends that understand it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Entry lifetime in seconds. `None` keeps the entry until overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CacheOptions {
    pub fn with_ttl(ttl: u64) -> Self {
        Self { ttl: Some(ttl), ..Default::default() }
    }

    /// The TTL as a Duration, if set.
    pub fn ttl_duration(&self) -> Option<Duration> {
        self.ttl.map(Duration::from_secs)
    }
}

/// Async get/set/delete over opaque values keyed by string.
///
/// Implementations must report a missing or expired key as `Ok(None)`.
#[async_trait]
pub trait KeyValueStore<V, O = CacheOptions>: Send + Sync
where
    V: Send + 'static,
    O: Send + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error>;

    async fn set(&self, key: &str, value: V, options: O) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;
}

#[async_trait]
impl<V, O, S> KeyValueStore<V, O> for Arc<S>
where
    S: KeyValueStore<V, O> + ?Sized,
    V: Send + 'static,
    O: Send + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: V, options: O) -> Result<(), Error> {
        (**self).set(key, value, options).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        (**self).delete(key).await
    }
}
