//! Client code for cachet.
//!
//! This crate provides the HTTP transport, the cache policy evaluator and
//! the cache-aware fetcher built on top of both.

pub mod body;
pub mod cache;
pub mod fetch;
pub mod headers;
pub mod policy;

pub use body::{Body, parse_body};
pub use cache::{
    CacheConfig, CacheItem, CacheOptionsSource, CacheWrite, CachedFetcher, Clock, FetchResult, KEY_PREFIX, SystemClock,
};
pub use fetch::{FetchConfig, HttpTransport, RequestOptions, Response, Transport, canonicalize};
pub use headers::{HeaderField, HeaderObject};
pub use policy::{CachePolicy, HttpCachePolicy, PolicyOptions};
