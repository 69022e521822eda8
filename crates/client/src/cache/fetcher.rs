//! Fetch-with-cache state machine.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Method, Url};

use cachet_core::{Error, KeyValueStore, Namespaced};

use super::{CacheConfig, CacheItem, Clock, FetchResult, KEY_PREFIX, StoreCandidate, SystemClock};
use crate::body::{Body, parse_body};
use crate::fetch::{RequestOptions, Response, Transport, canonicalize};
use crate::headers::merge_headers;
use crate::policy::{CachePolicy, HttpCachePolicy, RequestDescriptor, Revalidation};

/// Fetches through a transport, answering from a key-value store when it can.
///
/// Holds no mutable state of its own: concurrent fetches of one key may both
/// miss and both write, and the store's last write wins.
pub struct CachedFetcher<P = HttpCachePolicy> {
    transport: Arc<dyn Transport>,
    backend: Arc<dyn KeyValueStore<CacheItem>>,
    pub(super) store: Arc<dyn KeyValueStore<CacheItem>>,
    prefix: String,
    clock: Arc<dyn Clock>,
    _policy: PhantomData<fn() -> P>,
}

fn namespaced(backend: &Arc<dyn KeyValueStore<CacheItem>>, prefix: &str) -> Arc<dyn KeyValueStore<CacheItem>> {
    Arc::new(Namespaced::new(Arc::clone(backend), prefix))
}

/// A response rebuilt from a stored policy and body.
///
/// The body is re-encoded, so a stored `Content-Length` is replaced by the
/// length of the bytes actually served.
fn synthesize<P: CachePolicy>(stored_url: Option<&str>, fallback: &Url, policy: &P, body: &Body) -> Response {
    let url = stored_url.and_then(|url| Url::parse(url).ok()).unwrap_or_else(|| fallback.clone());
    let bytes = body.to_bytes();
    let mut headers = policy.described_headers();
    if headers.contains_key(header::CONTENT_LENGTH) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    }
    Response::new(url, policy.described_status(), headers, bytes)
}

impl<P: CachePolicy> CachedFetcher<P> {
    /// Keys are namespaced with [`KEY_PREFIX`] and time comes from the system clock.
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn KeyValueStore<CacheItem>>) -> Self {
        Self {
            transport,
            store: namespaced(&store, KEY_PREFIX),
            backend: store,
            prefix: KEY_PREFIX.to_string(),
            clock: Arc::new(SystemClock),
            _policy: PhantomData,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.store = namespaced(&self.backend, &self.prefix);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn key_prefix(&self) -> &str {
        &self.prefix
    }

    /// Fetch `url`, from the store when a fresh entry exists.
    ///
    /// HEAD requests always go to the network and never touch the store.
    /// `request.skip_cache` skips the lookup only; the response is still
    /// considered for storage. Store read failures are returned, not masked.
    pub async fn fetch(&self, url: &str, request: &RequestOptions, config: &CacheConfig) -> Result<FetchResult, Error> {
        let target = canonicalize(url)?;

        if request.method == Method::HEAD {
            tracing::debug!(url = %target, "HEAD request, cache bypassed");
            let response = self.transport.fetch(&target, request).await?;
            let body = parse_body(&response)?;
            return Ok(FetchResult { response, body, from_cache: false, cache_write: None });
        }

        let cache_key = config.cache_key.clone().unwrap_or_else(|| target.to_string());

        let cached: Option<CacheItem> = if request.skip_cache {
            tracing::debug!(key = %cache_key, "cache read skipped");
            None
        } else {
            self.store.get(&cache_key).await?
        };

        match cached {
            Some(item) => self.serve_hit(&target, request, config, cache_key, item).await,
            None => self.fetch_miss(&target, request, config, cache_key).await,
        }
    }

    async fn fetch_miss(
        &self,
        target: &Url,
        request: &RequestOptions,
        config: &CacheConfig,
        cache_key: String,
    ) -> Result<FetchResult, Error> {
        tracing::debug!(key = %cache_key, "cache miss");

        let response = self.transport.fetch(target, request).await?;
        let now = self.clock.now();
        let policy = P::new(RequestDescriptor::new(target.as_str(), request), (&response).into(), &config.policy, now);
        let body = parse_body(&response)?;

        self.decide_and_store(StoreCandidate {
            url: target.as_str(),
            response,
            body,
            request,
            policy: &policy,
            cache_key,
            cache_options: config.cache_options.as_ref(),
            from_cache: false,
            now,
        })
    }

    async fn serve_hit(
        &self,
        target: &Url,
        request: &RequestOptions,
        config: &CacheConfig,
        cache_key: String,
        item: CacheItem,
    ) -> Result<FetchResult, Error> {
        let CacheItem { policy, ttl_override, body } = item;
        let mut policy = P::from_value(policy)?;

        // A custom key may map many URLs to one entry; the recorded URL must not gate the match.
        let stored_url = policy.take_described_url();

        let now = self.clock.now();
        let descriptor = RequestDescriptor::new(target.as_str(), request);
        let fresh = match ttl_override {
            Some(ttl) => policy.age(now) < Duration::from_secs(ttl),
            None => policy.is_fresh_without_revalidation(descriptor, now),
        };

        if fresh {
            tracing::debug!(key = %cache_key, "cache hit");
            let response = synthesize(stored_url.as_deref(), target, &policy, &body);
            return Ok(FetchResult { response, body, from_cache: true, cache_write: None });
        }

        tracing::debug!(key = %cache_key, "stale entry, revalidating");

        let conditional = policy.revalidation_headers(descriptor);
        let revalidation = RequestOptions { headers: merge_headers(&request.headers, &conditional), ..request.clone() };
        let response = self.transport.fetch(target, &revalidation).await?;

        let Revalidation { policy: revalidated, modified } = policy.revalidate(descriptor, (&response).into(), now);

        let (response, body) = if modified {
            let body = parse_body(&response)?;
            (response, body)
        } else {
            tracing::debug!(key = %cache_key, "origin reports not modified");
            (synthesize(revalidated.described_url(), target, &revalidated, &body), body)
        };

        self.decide_and_store(StoreCandidate {
            url: target.as_str(),
            response,
            body,
            request,
            policy: &revalidated,
            cache_key,
            cache_options: config.cache_options.as_ref(),
            from_cache: !modified,
            now,
        })
    }
}
