//! Storage decision for fetched and revalidated responses.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::header;

use cachet_core::{Error, KeyValueStore};

use super::{CacheItem, CacheOptionsSource, CacheWrite, CachedFetcher, FetchResult};
use crate::body::Body;
use crate::fetch::{RequestOptions, Response};
use crate::policy::CachePolicy;

/// A response that may be written to the store.
#[derive(Debug)]
pub struct StoreCandidate<'a, P> {
    /// URL passed to computed store options.
    pub url: &'a str,
    pub response: Response,
    pub body: Body,
    pub request: &'a RequestOptions,
    pub policy: &'a P,
    pub cache_key: String,
    pub cache_options: Option<&'a CacheOptionsSource>,
    /// Reported back unchanged in the [`FetchResult`].
    pub from_cache: bool,
    pub now: DateTime<Utc>,
}

impl<P: CachePolicy> CachedFetcher<P> {
    /// Decide whether `candidate` is stored and for how long, start the write
    /// if so, and return the response to the caller without waiting for it.
    pub fn decide_and_store(&self, candidate: StoreCandidate<'_, P>) -> Result<FetchResult, Error> {
        let StoreCandidate { url, response, body, request, policy, cache_key, cache_options, from_cache, now } =
            candidate;

        let options = cache_options.and_then(|source| source.resolve(url, &response, request));
        let ttl_override = options.as_ref().and_then(|options| options.ttl);

        let eligible = match ttl_override {
            Some(_) => response.status.is_success(),
            None => request.method == Method::GET && policy.is_storable(),
        };
        if !eligible {
            tracing::debug!(key = %cache_key, status = response.status.as_u16(), "response not stored");
            return Ok(FetchResult { response, body, from_cache, cache_write: None });
        }

        let mut ttl = match ttl_override {
            Some(ttl) => ttl,
            None => policy.time_to_live(now).as_secs_f64().round() as u64,
        };
        if ttl == 0 {
            tracing::debug!(key = %cache_key, "response already stale, not stored");
            return Ok(FetchResult { response, body, from_cache, cache_write: None });
        }

        // Keep revalidatable entries past their freshness window.
        if response.headers.contains_key(header::ETAG) || response.headers.contains_key(header::LAST_MODIFIED) {
            ttl = ttl.saturating_mul(2);
        }

        let item = CacheItem { policy: policy.to_value()?, ttl_override, body: body.clone() };
        let mut store_options = options.unwrap_or_default();
        store_options.ttl = Some(ttl);

        tracing::debug!(key = %cache_key, ttl, "storing response");

        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            let result = store.set(&cache_key, item, store_options).await;
            if let Err(e) = &result {
                tracing::warn!(key = %cache_key, error = %e, "cache write failed");
            }
            result
        });

        Ok(FetchResult { response, body, from_cache, cache_write: Some(CacheWrite { handle }) })
    }
}
