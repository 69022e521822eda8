//! Cache policy evaluation.
//!
//! The cache layer never interprets `Cache-Control` itself. It asks a
//! [`CachePolicy`] whether a stored response is fresh, which validators to
//! send, how a revalidation response merges with the stored one, and whether
//! and for how long a response may be stored. [`HttpCachePolicy`] is the
//! RFC 7234 implementation used by default.

pub mod directives;
pub mod http;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use cachet_core::Error;

use crate::fetch::{RequestOptions, Response};

pub use directives::CacheControl;
pub use http::HttpCachePolicy;

/// The request side of a policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub url: &'a str,
    pub method: &'a Method,
    pub headers: &'a HeaderMap,
}

impl<'a> RequestDescriptor<'a> {
    pub fn new(url: &'a str, request: &'a RequestOptions) -> Self {
        Self { url, method: &request.method, headers: &request.headers }
    }
}

/// The response side of a policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ResponseDescriptor<'a> {
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
}

impl<'a> From<&'a Response> for ResponseDescriptor<'a> {
    fn from(response: &'a Response) -> Self {
        Self { status: response.status, headers: &response.headers }
    }
}

/// Evaluator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOptions {
    /// Behave as a shared cache: honour `s-maxage`, refuse `private`.
    pub shared: bool,
    /// Fraction of `Date - Last-Modified` used as heuristic freshness.
    pub cache_heuristic: f64,
    /// Minimum freshness for `immutable` responses without explicit expiry.
    pub immutable_min_ttl: Duration,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self { shared: false, cache_heuristic: 0.1, immutable_min_ttl: Duration::from_secs(24 * 3600) }
    }
}

/// Outcome of merging a stored policy with a revalidation response.
#[derive(Debug, Clone)]
pub struct Revalidation<P> {
    pub policy: P,
    /// `false` when the origin confirmed the stored body is still current.
    pub modified: bool,
}

/// Contract of a cache policy evaluator.
///
/// A policy is built from one request/response pair and persisted through
/// serde as an opaque JSON value. `now` is passed explicitly so callers
/// control the clock.
pub trait CachePolicy: Serialize + DeserializeOwned + Send + Sync + Sized + 'static {
    fn new(
        request: RequestDescriptor<'_>,
        response: ResponseDescriptor<'_>,
        options: &PolicyOptions,
        now: DateTime<Utc>,
    ) -> Self;

    /// Whether the stored response can answer `request` without contacting the origin.
    fn is_fresh_without_revalidation(&self, request: RequestDescriptor<'_>, now: DateTime<Utc>) -> bool;

    /// Conditional validators to attach to a revalidation of `request`.
    fn revalidation_headers(&self, request: RequestDescriptor<'_>) -> HeaderMap;

    /// Merge this policy with the origin's answer to a revalidation request.
    fn revalidate(
        &self,
        request: RequestDescriptor<'_>,
        response: ResponseDescriptor<'_>,
        now: DateTime<Utc>,
    ) -> Revalidation<Self>;

    fn is_storable(&self) -> bool;

    fn time_to_live(&self, now: DateTime<Utc>) -> Duration;

    fn age(&self, now: DateTime<Utc>) -> Duration;

    /// URL the policy was created for, if still recorded.
    fn described_url(&self) -> Option<&str>;

    /// Remove and return the recorded URL so it no longer gates request matching.
    fn take_described_url(&mut self) -> Option<String>;

    fn described_status(&self) -> StatusCode;

    /// Response headers as they should be served from cache.
    fn described_headers(&self) -> HeaderMap;

    fn to_value(&self) -> Result<serde_json::Value, Error> {
        serde_json::to_value(self).map_err(|e| Error::PolicyDecode(format!("cannot encode policy: {}", e)))
    }

    fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::PolicyDecode(e.to_string()))
    }
}
