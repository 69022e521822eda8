//! RFC 7234 cache policy.
//!
//! Covers the parts of the caching model a private or shared client cache
//! needs: storability, explicit and heuristic freshness, age, request
//! directives (`no-cache`, `max-age`, `min-fresh`, `max-stale`), `Vary`
//! matching, conditional validators and 304 merging.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use cachet_core::Error;

use super::directives::CacheControl;
use super::{CachePolicy, PolicyOptions, RequestDescriptor, ResponseDescriptor, Revalidation};
use crate::headers::{HeaderField, HeaderObject, from_header_object, to_header_object};

/// Statuses whose semantics a cache understands well enough to store.
const UNDERSTOOD_STATUSES: &[u16] = &[200, 203, 204, 206, 300, 301, 302, 303, 307, 308, 404, 405, 410, 414, 501];

/// Statuses that may be stored and heuristically fresh without explicit expiry.
const CACHEABLE_BY_DEFAULT: &[u16] = &[200, 203, 204, 206, 300, 301, 308, 404, 405, 410, 414, 501];

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers a 304 must not overwrite on the stored response.
const KEPT_ON_REVALIDATION: &[&str] = &["content-length", "content-encoding", "content-range", "transfer-encoding"];

/// Serializable policy for one request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpCachePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    method: String,
    status: u16,
    request_headers: HeaderObject,
    response_headers: HeaderObject,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    response_time: DateTime<Utc>,
    shared: bool,
    cache_heuristic: f64,
    immutable_min_ttl: u64,
}

fn first<'a>(object: &'a HeaderObject, name: &str) -> Option<&'a str> {
    object.get(name).and_then(HeaderField::first)
}

fn http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim()).ok().map(|date| date.with_timezone(&Utc))
}

fn elapsed(later: DateTime<Utc>, earlier: DateTime<Utc>) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// `Cache-Control` of a header object, falling back to `Pragma: no-cache`.
fn cache_control(object: &HeaderObject) -> CacheControl {
    match object.get("cache-control") {
        Some(field) => CacheControl::parse(&field.joined()),
        None => {
            let mut cc = CacheControl::default();
            if object.get("pragma").is_some_and(|pragma| pragma.joined().contains("no-cache")) {
                cc.insert("no-cache", None);
            }
            cc
        }
    }
}

impl HttpCachePolicy {
    fn options(&self) -> PolicyOptions {
        PolicyOptions {
            shared: self.shared,
            cache_heuristic: self.cache_heuristic,
            immutable_min_ttl: Duration::from_secs(self.immutable_min_ttl),
        }
    }

    fn response_cache_control(&self) -> CacheControl {
        cache_control(&self.response_headers)
    }

    fn has_explicit_expiration(&self) -> bool {
        let cc = self.response_cache_control();
        (self.shared && cc.has("s-maxage")) || cc.has("max-age") || self.response_headers.contains_key("expires")
    }

    fn allows_storing_authenticated(&self) -> bool {
        let cc = self.response_cache_control();
        cc.has("must-revalidate") || cc.has("public") || cc.has("s-maxage")
    }

    /// `Date` sent by the origin, or our receive time when absent or invalid.
    fn server_date(&self) -> DateTime<Utc> {
        first(&self.response_headers, "date").and_then(http_date).unwrap_or(self.response_time)
    }

    /// Freshness lifetime of the stored response.
    pub fn max_age(&self) -> Duration {
        let cc = self.response_cache_control();

        if cc.has("no-cache") || (self.shared && cc.has("private")) {
            return Duration::ZERO;
        }
        if self.response_headers.get("vary").is_some_and(|vary| vary.joined().trim() == "*") {
            return Duration::ZERO;
        }

        if self.shared
            && let Some(seconds) = cc.seconds("s-maxage")
        {
            return Duration::from_secs(seconds);
        }
        if let Some(seconds) = cc.seconds("max-age") {
            return Duration::from_secs(seconds);
        }

        let floor = if cc.has("immutable") { Duration::from_secs(self.immutable_min_ttl) } else { Duration::ZERO };
        let date = self.server_date();

        if let Some(expires) = first(&self.response_headers, "expires") {
            // An unparseable Expires means "already expired".
            return match http_date(expires) {
                Some(expires) => elapsed(expires, date).max(floor),
                None => Duration::ZERO,
            };
        }

        if CACHEABLE_BY_DEFAULT.contains(&self.status)
            && let Some(last_modified) = first(&self.response_headers, "last-modified").and_then(http_date)
            && last_modified < date
        {
            let heuristic = elapsed(date, last_modified).as_secs_f64() * self.cache_heuristic;
            return Duration::try_from_secs_f64(heuristic).unwrap_or(Duration::ZERO).max(floor);
        }

        floor
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.max_age() <= self.age(now)
    }

    fn vary_matches(&self, request: RequestDescriptor<'_>) -> bool {
        let Some(vary) = self.response_headers.get("vary").map(HeaderField::joined) else {
            return true;
        };
        if vary.trim() == "*" {
            return false;
        }

        let incoming = to_header_object(request.headers);
        vary.split(',')
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .all(|name| self.request_headers.get(&name) == incoming.get(&name))
    }

    fn request_matches(&self, request: RequestDescriptor<'_>, allow_head: bool) -> bool {
        self.url.as_deref().is_none_or(|url| url == request.url)
            && (self.method == request.method.as_str() || (allow_head && *request.method == Method::HEAD))
            && self.vary_matches(request)
    }

    fn etag(&self) -> Option<&str> {
        first(&self.response_headers, "etag")
    }

    fn last_modified(&self) -> Option<&str> {
        first(&self.response_headers, "last-modified")
    }

    /// Whether a 304 refers to the stored response, compared weakly.
    fn validators_match(&self, response: &HeaderObject) -> bool {
        let strip = |tag: &str| tag.trim().trim_start_matches("W/").to_string();
        match (first(response, "etag"), self.etag()) {
            (Some(new), Some(old)) => strip(new) == strip(old),
            (Some(_), None) => false,
            (None, _) => match (first(response, "last-modified"), self.last_modified()) {
                (Some(new), Some(old)) => new == old,
                (None, _) => self.etag().is_none() && self.last_modified().is_none(),
                (Some(_), None) => false,
            },
        }
    }
}

impl CachePolicy for HttpCachePolicy {
    fn new(
        request: RequestDescriptor<'_>,
        response: ResponseDescriptor<'_>,
        options: &PolicyOptions,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            url: Some(request.url.to_string()),
            method: request.method.as_str().to_string(),
            status: response.status.as_u16(),
            request_headers: to_header_object(request.headers),
            response_headers: to_header_object(response.headers),
            response_time: now,
            shared: options.shared,
            cache_heuristic: options.cache_heuristic,
            immutable_min_ttl: options.immutable_min_ttl.as_secs(),
        }
    }

    fn is_fresh_without_revalidation(&self, request: RequestDescriptor<'_>, now: DateTime<Utc>) -> bool {
        let request_cc = cache_control(&to_header_object(request.headers));
        if request_cc.has("no-cache") {
            return false;
        }

        let age = self.age(now);
        let max_age = self.max_age();

        if let Some(limit) = request_cc.seconds("max-age")
            && age > Duration::from_secs(limit)
        {
            return false;
        }
        if let Some(min_fresh) = request_cc.seconds("min-fresh")
            && max_age.saturating_sub(age) < Duration::from_secs(min_fresh)
        {
            return false;
        }

        if self.is_stale(now) {
            let allows_stale = request_cc.has("max-stale")
                && !self.response_cache_control().has("must-revalidate")
                && match request_cc.argument("max-stale") {
                    None => true,
                    Some(_) => request_cc
                        .seconds("max-stale")
                        .is_some_and(|limit| Duration::from_secs(limit) > age - max_age),
                };
            if !allows_stale {
                return false;
            }
        }

        self.request_matches(request, false)
    }

    fn revalidation_headers(&self, request: RequestDescriptor<'_>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !self.request_matches(request, true) {
            return headers;
        }

        let forbids_weak = *request.method != Method::GET
            || request.headers.contains_key(header::IF_MATCH)
            || request.headers.contains_key(header::IF_UNMODIFIED_SINCE)
            || request.headers.contains_key(header::RANGE);

        if let Some(etag) = self.etag()
            && !(forbids_weak && etag.trim_start().starts_with("W/"))
            && let Ok(value) = HeaderValue::from_str(etag)
        {
            headers.insert(header::IF_NONE_MATCH, value);
        }

        if !forbids_weak
            && let Some(last_modified) = self.last_modified()
            && let Ok(value) = HeaderValue::from_str(last_modified)
        {
            headers.insert(header::IF_MODIFIED_SINCE, value);
        }

        headers
    }

    fn revalidate(
        &self,
        request: RequestDescriptor<'_>,
        response: ResponseDescriptor<'_>,
        now: DateTime<Utc>,
    ) -> Revalidation<Self> {
        if response.status != StatusCode::NOT_MODIFIED {
            return Revalidation { policy: Self::new(request, response, &self.options(), now), modified: true };
        }

        let update = to_header_object(response.headers);
        if !self.validators_match(&update) {
            tracing::debug!(url = request.url, "304 validators differ from stored response");
        }

        let mut response_headers = self.response_headers.clone();
        for (name, field) in update {
            if !KEPT_ON_REVALIDATION.contains(&name.as_str()) {
                response_headers.insert(name, field);
            }
        }

        let policy = Self {
            url: Some(request.url.to_string()),
            method: request.method.as_str().to_string(),
            status: self.status,
            request_headers: to_header_object(request.headers),
            response_headers,
            response_time: now,
            ..self.clone()
        };

        Revalidation { policy, modified: false }
    }

    fn is_storable(&self) -> bool {
        let request_cc = cache_control(&self.request_headers);
        let response_cc = self.response_cache_control();

        let method_ok = self.method == Method::GET.as_str()
            || self.method == Method::HEAD.as_str()
            || (self.method == Method::POST.as_str() && self.has_explicit_expiration());

        !request_cc.has("no-store")
            && method_ok
            && UNDERSTOOD_STATUSES.contains(&self.status)
            && !response_cc.has("no-store")
            && (!self.shared || !response_cc.has("private"))
            && (!self.shared || !self.request_headers.contains_key("authorization") || self.allows_storing_authenticated())
            && (self.has_explicit_expiration()
                || response_cc.has("public")
                || CACHEABLE_BY_DEFAULT.contains(&self.status))
    }

    fn time_to_live(&self, now: DateTime<Utc>) -> Duration {
        self.max_age().saturating_sub(self.age(now))
    }

    fn age(&self, now: DateTime<Utc>) -> Duration {
        let reported = first(&self.response_headers, "age")
            .and_then(|age| age.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Duration::from_secs(reported).saturating_add(elapsed(now, self.response_time))
    }

    fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        let policy: Self = serde_json::from_value(value).map_err(|e| Error::PolicyDecode(e.to_string()))?;
        if !policy.cache_heuristic.is_finite() || policy.cache_heuristic < 0.0 {
            return Err(Error::PolicyDecode(format!("invalid cache_heuristic {}", policy.cache_heuristic)));
        }
        Ok(policy)
    }

    fn described_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn take_described_url(&mut self) -> Option<String> {
        self.url.take()
    }

    fn described_status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK)
    }

    fn described_headers(&self) -> HeaderMap {
        let mut headers = from_header_object(&self.response_headers);
        for name in HOP_BY_HOP {
            headers.remove(*name);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderName;

    const URL: &str = "https://example.com/a";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::seconds(seconds)
    }

    fn http_date_string(date: DateTime<Utc>) -> String {
        date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(HeaderName::from_bytes(name.as_bytes()).unwrap(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn policy_for(method: &Method, request: &HeaderMap, status: u16, response: &[(&str, &str)]) -> HttpCachePolicy {
        let response = headers(response);
        HttpCachePolicy::new(
            RequestDescriptor { url: URL, method, headers: request },
            ResponseDescriptor { status: StatusCode::from_u16(status).unwrap(), headers: &response },
            &PolicyOptions::default(),
            t0(),
        )
    }

    fn get_policy(status: u16, response: &[(&str, &str)]) -> HttpCachePolicy {
        policy_for(&Method::GET, &HeaderMap::new(), status, response)
    }

    fn get<'a>(url: &'a str, headers: &'a HeaderMap) -> RequestDescriptor<'a> {
        RequestDescriptor { url, method: &Method::GET, headers }
    }

    #[test]
    fn test_max_age_ttl() {
        let policy = get_policy(200, &[("cache-control", "max-age=60")]);
        assert!(policy.is_storable());
        assert_eq!(policy.time_to_live(t0()), Duration::from_secs(60));
        assert_eq!(policy.time_to_live(at(20)), Duration::from_secs(40));
        assert_eq!(policy.time_to_live(at(90)), Duration::ZERO);
    }

    #[test]
    fn test_age_header_counts_towards_age() {
        let policy = get_policy(200, &[("cache-control", "max-age=60"), ("age", "50")]);
        assert_eq!(policy.age(at(5)), Duration::from_secs(55));
        assert_eq!(policy.time_to_live(at(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_no_store_is_not_storable() {
        assert!(!get_policy(200, &[("cache-control", "no-store")]).is_storable());

        let request = headers(&[("cache-control", "no-store")]);
        assert!(!policy_for(&Method::GET, &request, 200, &[("cache-control", "max-age=60")]).is_storable());
    }

    #[test]
    fn test_private_only_refused_by_shared_cache() {
        let response = headers(&[("cache-control", "private, max-age=60")]);
        let request = HeaderMap::new();
        let descriptor = RequestDescriptor { url: URL, method: &Method::GET, headers: &request };
        let response = ResponseDescriptor { status: StatusCode::OK, headers: &response };

        let private = HttpCachePolicy::new(descriptor, response, &PolicyOptions::default(), t0());
        let shared = HttpCachePolicy::new(
            descriptor,
            response,
            &PolicyOptions { shared: true, ..Default::default() },
            t0(),
        );

        assert!(private.is_storable());
        assert!(!shared.is_storable());
    }

    #[test]
    fn test_post_needs_explicit_expiration() {
        assert!(!policy_for(&Method::POST, &HeaderMap::new(), 200, &[]).is_storable());
        assert!(policy_for(&Method::POST, &HeaderMap::new(), 200, &[("cache-control", "max-age=5")]).is_storable());
    }

    #[test]
    fn test_server_error_is_not_storable() {
        assert!(!get_policy(500, &[("cache-control", "max-age=60")]).is_storable());
    }

    #[test]
    fn test_expires_relative_to_date() {
        let policy = get_policy(
            200,
            &[("date", &http_date_string(t0())), ("expires", &http_date_string(at(120)))],
        );
        assert_eq!(policy.max_age(), Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_expires_is_expired() {
        let policy = get_policy(200, &[("expires", "0")]);
        assert_eq!(policy.max_age(), Duration::ZERO);
    }

    #[test]
    fn test_last_modified_heuristic() {
        let policy = get_policy(
            200,
            &[("date", &http_date_string(t0())), ("last-modified", &http_date_string(at(-1000)))],
        );
        assert_eq!(policy.max_age(), Duration::from_secs(100));
    }

    #[test]
    fn test_immutable_floor() {
        let policy = get_policy(200, &[("cache-control", "immutable")]);
        assert_eq!(policy.max_age(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_fresh_then_stale() {
        let policy = get_policy(200, &[("cache-control", "max-age=60")]);
        let request = HeaderMap::new();
        assert!(policy.is_fresh_without_revalidation(get(URL, &request), at(30)));
        assert!(!policy.is_fresh_without_revalidation(get(URL, &request), at(61)));
    }

    #[test]
    fn test_request_directives() {
        let policy = get_policy(200, &[("cache-control", "max-age=60")]);

        let no_cache = headers(&[("cache-control", "no-cache")]);
        assert!(!policy.is_fresh_without_revalidation(get(URL, &no_cache), at(1)));

        let max_age = headers(&[("cache-control", "max-age=10")]);
        assert!(!policy.is_fresh_without_revalidation(get(URL, &max_age), at(20)));

        let max_stale = headers(&[("cache-control", "max-stale=30")]);
        assert!(policy.is_fresh_without_revalidation(get(URL, &max_stale), at(80)));
        assert!(!policy.is_fresh_without_revalidation(get(URL, &max_stale), at(100)));
    }

    #[test]
    fn test_must_revalidate_refuses_max_stale() {
        let policy = get_policy(200, &[("cache-control", "max-age=60, must-revalidate")]);
        let max_stale = headers(&[("cache-control", "max-stale")]);
        assert!(!policy.is_fresh_without_revalidation(get(URL, &max_stale), at(80)));
    }

    #[test]
    fn test_url_gates_match_until_taken() {
        let mut policy = get_policy(200, &[("cache-control", "max-age=60")]);
        let request = HeaderMap::new();
        let other = "https://example.com/other";

        assert!(!policy.is_fresh_without_revalidation(get(other, &request), at(1)));
        assert_eq!(policy.take_described_url().as_deref(), Some(URL));
        assert!(policy.described_url().is_none());
        assert!(policy.is_fresh_without_revalidation(get(other, &request), at(1)));
    }

    #[test]
    fn test_vary_mismatch_is_not_fresh() {
        let stored_request = headers(&[("accept", "application/json")]);
        let policy = policy_for(
            &Method::GET,
            &stored_request,
            200,
            &[("cache-control", "max-age=60"), ("vary", "Accept")],
        );

        assert!(policy.is_fresh_without_revalidation(get(URL, &stored_request), at(1)));
        let text = headers(&[("accept", "text/plain")]);
        assert!(!policy.is_fresh_without_revalidation(get(URL, &text), at(1)));
    }

    #[test]
    fn test_revalidation_headers_carry_validators() {
        let policy = get_policy(
            200,
            &[("etag", "\"v1\""), ("last-modified", "Thu, 01 Jan 2026 00:00:00 GMT")],
        );
        let request = HeaderMap::new();
        let conditional = policy.revalidation_headers(get(URL, &request));

        assert_eq!(conditional.get(header::IF_NONE_MATCH).unwrap(), "\"v1\"");
        assert_eq!(conditional.get(header::IF_MODIFIED_SINCE).unwrap(), "Thu, 01 Jan 2026 00:00:00 GMT");
    }

    #[test]
    fn test_range_request_drops_weak_validators() {
        let policy = get_policy(200, &[("etag", "W/\"v1\""), ("last-modified", "Thu, 01 Jan 2026 00:00:00 GMT")]);
        let request = headers(&[("range", "bytes=0-9")]);
        assert!(policy.revalidation_headers(get(URL, &request)).is_empty());
    }

    #[test]
    fn test_revalidate_not_modified_merges_headers() {
        let policy = get_policy(
            200,
            &[("etag", "\"v1\""), ("cache-control", "max-age=60"), ("content-length", "7"), ("x-origin", "a")],
        );
        let request = HeaderMap::new();
        let update = headers(&[("etag", "\"v1\""), ("cache-control", "max-age=120"), ("content-length", "0")]);

        let Revalidation { policy: merged, modified } = policy.revalidate(
            get(URL, &request),
            ResponseDescriptor { status: StatusCode::NOT_MODIFIED, headers: &update },
            at(300),
        );

        assert!(!modified);
        assert_eq!(merged.described_status(), StatusCode::OK);
        let served = merged.described_headers();
        assert_eq!(served.get(header::CACHE_CONTROL).unwrap(), "max-age=120");
        assert_eq!(served.get(header::CONTENT_LENGTH).unwrap(), "7");
        assert_eq!(served.get("x-origin").unwrap(), "a");
        assert_eq!(merged.time_to_live(at(300)), Duration::from_secs(120));
        assert_eq!(merged.described_url(), Some(URL));
    }

    #[test]
    fn test_revalidate_new_content_is_modified() {
        let policy = get_policy(200, &[("etag", "\"v1\""), ("cache-control", "max-age=60")]);
        let request = HeaderMap::new();
        let fresh = headers(&[("etag", "\"v2\""), ("cache-control", "max-age=30")]);

        let revalidation = policy.revalidate(
            get(URL, &request),
            ResponseDescriptor { status: StatusCode::OK, headers: &fresh },
            at(300),
        );

        assert!(revalidation.modified);
        assert_eq!(revalidation.policy.described_headers().get(header::ETAG).unwrap(), "\"v2\"");
        assert_eq!(revalidation.policy.time_to_live(at(300)), Duration::from_secs(30));
    }

    #[test]
    fn test_weak_etag_comparison() {
        let policy = get_policy(200, &[("etag", "W/\"v1\"")]);
        let update = to_header_object(&headers(&[("etag", "\"v1\"")]));
        assert!(policy.validators_match(&update));
        let other = to_header_object(&headers(&[("etag", "\"v2\"")]));
        assert!(!policy.validators_match(&other));
    }

    #[test]
    fn test_described_headers_drop_hop_by_hop() {
        let policy = get_policy(200, &[("connection", "keep-alive"), ("etag", "\"v1\"")]);
        let served = policy.described_headers();
        assert!(served.get(header::CONNECTION).is_none());
        assert!(served.get(header::ETAG).is_some());
    }

    #[test]
    fn test_extreme_header_values_saturate() {
        let policy = get_policy(
            200,
            &[
                ("age", "18446744073709551615"),
                ("cache-control", "max-age=18446744073709551615"),
                ("expires", "Fri, 31 Dec 9999 23:59:59 GMT"),
            ],
        );
        let request = HeaderMap::new();

        assert!(policy.age(at(1)) >= Duration::from_secs(u64::MAX));
        assert_eq!(policy.max_age(), Duration::from_secs(u64::MAX));
        assert_eq!(policy.time_to_live(at(1)), Duration::ZERO);
        assert!(!policy.is_fresh_without_revalidation(get(URL, &request), at(1)));
    }

    #[test]
    fn test_far_future_expires() {
        let policy = get_policy(
            200,
            &[("date", &http_date_string(t0())), ("expires", "Fri, 31 Dec 9999 23:59:59 GMT")],
        );
        let request = HeaderMap::new();

        assert!(policy.time_to_live(t0()) > Duration::from_secs(7000 * 365 * 24 * 3600));
        assert!(policy.is_fresh_without_revalidation(get(URL, &request), at(1)));
    }

    #[test]
    fn test_out_of_range_heuristic_yields_zero() {
        let mut policy = get_policy(
            200,
            &[("date", &http_date_string(t0())), ("last-modified", &http_date_string(at(-1000)))],
        );

        policy.cache_heuristic = -1.0;
        assert_eq!(policy.max_age(), Duration::ZERO);

        policy.cache_heuristic = f64::MAX;
        assert_eq!(policy.max_age(), Duration::ZERO);
    }

    #[test]
    fn test_decode_rejects_negative_heuristic() {
        let mut value = get_policy(200, &[]).to_value().unwrap();
        value["cache_heuristic"] = serde_json::json!(-0.5);
        assert!(matches!(HttpCachePolicy::from_value(value), Err(Error::PolicyDecode(_))));
    }

    #[test]
    fn test_value_round_trip() {
        let policy = get_policy(200, &[("cache-control", "max-age=60"), ("set-cookie", "a=1"), ("set-cookie", "b=2")]);
        let value = policy.to_value().unwrap();

        assert_eq!(value["response_headers"]["cache-control"], serde_json::json!("max-age=60"));
        assert_eq!(value["response_headers"]["set-cookie"], serde_json::json!(["a=1", "b=2"]));
        assert_eq!(HttpCachePolicy::from_value(value).unwrap(), policy);
    }

    #[test]
    fn test_malformed_value_is_policy_decode_error() {
        let result = HttpCachePolicy::from_value(serde_json::json!({"status": "two hundred"}));
        assert!(matches!(result, Err(Error::PolicyDecode(_))));
    }
}
