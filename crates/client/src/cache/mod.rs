//! Cache-aware fetching.
//!
//! [`CachedFetcher::fetch`] answers a request from the store when the stored
//! entry is still fresh, revalidates it conditionally when it is stale, and
//! otherwise fetches live. Whether and for how long a response is kept is
//! decided by [`CachedFetcher::decide_and_store`]:
//!
//! - With a caller TTL override, any 2xx response is stored for exactly that
//!   long, whatever its method or `Cache-Control`
//! - Without one, only GET responses the policy reports storable are kept,
//!   for the policy's time-to-live
//! - Responses carrying an `ETag` or `Last-Modified` are kept twice as long
//!   so an expired entry can still be revalidated cheaply
//!
//! Store writes run on a spawned task. The result is returned immediately and
//! callers that need the write to have landed await [`CacheWrite::wait`].

pub mod clock;
pub mod fetcher;
pub mod storage;

#[cfg(test)]
mod testing;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use cachet_core::{CacheOptions, Error};

use crate::body::Body;
use crate::fetch::{RequestOptions, Response};
use crate::policy::PolicyOptions;

pub use clock::{Clock, SystemClock};
pub use fetcher::CachedFetcher;
pub use storage::StoreCandidate;

/// Namespace prepended to every key the fetcher reads or writes.
pub const KEY_PREFIX: &str = "cachet:";

/// A stored cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem {
    /// Serialized policy; only the policy implementation interprets it.
    pub policy: serde_json::Value,
    /// Caller TTL in seconds. Takes precedence over header freshness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_override: Option<u64>,
    pub body: Body,
}

type OptionsFn = dyn Fn(&str, &Response, &RequestOptions) -> Option<CacheOptions> + Send + Sync;

/// Store options, fixed up front or computed from the response being stored.
#[derive(Clone)]
pub enum CacheOptionsSource {
    Static(CacheOptions),
    Computed(Arc<OptionsFn>),
}

impl CacheOptionsSource {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&str, &Response, &RequestOptions) -> Option<CacheOptions> + Send + Sync + 'static,
    {
        CacheOptionsSource::Computed(Arc::new(f))
    }

    /// Concrete options for one storage decision.
    pub fn resolve(&self, url: &str, response: &Response, request: &RequestOptions) -> Option<CacheOptions> {
        match self {
            CacheOptionsSource::Static(options) => Some(options.clone()),
            CacheOptionsSource::Computed(f) => f(url, response, request),
        }
    }
}

impl fmt::Debug for CacheOptionsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOptionsSource::Static(options) => f.debug_tuple("Static").field(options).finish(),
            CacheOptionsSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<CacheOptions> for CacheOptionsSource {
    fn from(options: CacheOptions) -> Self {
        CacheOptionsSource::Static(options)
    }
}

/// Per-call cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Store key. Defaults to the canonical request URL.
    pub cache_key: Option<String>,
    pub cache_options: Option<CacheOptionsSource>,
    pub policy: PolicyOptions,
}

impl CacheConfig {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_options(mut self, options: impl Into<CacheOptionsSource>) -> Self {
        self.cache_options = Some(options.into());
        self
    }

    /// Shorthand for a static TTL override.
    pub fn with_ttl(self, ttl: u64) -> Self {
        self.with_options(CacheOptions::with_ttl(ttl))
    }
}

/// Handle to a detached store write.
#[derive(Debug)]
pub struct CacheWrite {
    handle: JoinHandle<Result<(), Error>>,
}

impl CacheWrite {
    /// Wait for the write to finish and report its outcome.
    pub async fn wait(self) -> Result<(), Error> {
        self.handle.await.map_err(|e| Error::CacheWrite(e.to_string()))?
    }
}

/// Outcome of a cached fetch.
#[derive(Debug)]
pub struct FetchResult {
    pub response: Response,
    pub body: Body,
    /// Served from the store, either fresh or confirmed unchanged by the origin.
    pub from_cache: bool,
    /// Present when a store write was started for this response.
    pub cache_write: Option<CacheWrite>,
}
