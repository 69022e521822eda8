//! Test doubles for the cache layer.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{StatusCode, Url};

use cachet_core::{CacheOptions, Error, KeyValueStore, MemoryStore};

use super::{CacheItem, Clock};
use crate::fetch::{RequestOptions, Response, Transport};

/// A clock that only moves when told to. Millisecond resolution.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { millis: AtomicI64::new(start.timestamp_millis()) }
    }

    pub fn advance(&self, by: Duration) {
        let millis = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub fn response(status: u16, headers: &[(&str, &str)], body: &str) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(HeaderName::from_bytes(name.as_bytes()).unwrap(), HeaderValue::from_str(value).unwrap());
    }
    Response::new(
        Url::parse("https://example.com/a").unwrap(),
        StatusCode::from_u16(status).unwrap(),
        map,
        body.to_string(),
    )
}

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<(Url, RequestOptions)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Response>) -> Self {
        Self { responses: Mutex::new(responses.into()), requests: Mutex::default() }
    }

    pub fn push(&self, response: Response) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<(Url, RequestOptions)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &Url, request: &RequestOptions) -> Result<Response, Error> {
        self.requests.lock().unwrap().push((url.clone(), request.clone()));
        let mut response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::HttpError("no scripted response left".into()))?;
        response.url = url.clone();
        Ok(response)
    }
}

/// In-memory store that counts calls.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore<CacheItem>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    last_key: Mutex<Option<String>>,
    last_options: Mutex<Option<CacheOptions>>,
}

impl CountingStore {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn last_key(&self) -> Option<String> {
        self.last_key.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<CacheOptions> {
        self.last_options.lock().unwrap().clone()
    }

    pub async fn raw(&self, key: &str) -> Option<CacheItem> {
        self.inner.get(key).await.unwrap()
    }

    pub async fn put_raw(&self, key: &str, item: CacheItem) {
        self.inner.set(key, item, CacheOptions::default()).await.unwrap();
    }
}

#[async_trait]
impl KeyValueStore<CacheItem> for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<CacheItem>, Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: CacheItem, options: CacheOptions) -> Result<(), Error> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        *self.last_key.lock().unwrap() = Some(key.to_string());
        *self.last_options.lock().unwrap() = Some(options.clone());
        self.inner.set(key, value, options).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.inner.delete(key).await
    }
}

/// Store whose writes always fail; reads fail too when `fail_reads` is set.
pub struct FailingStore {
    pub fail_reads: bool,
}

#[async_trait]
impl KeyValueStore<CacheItem> for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<CacheItem>, Error> {
        if self.fail_reads { Err(Error::Store("connection refused".into())) } else { Ok(None) }
    }

    async fn set(&self, _key: &str, _value: CacheItem, _options: CacheOptions) -> Result<(), Error> {
        Err(Error::Store("disk full".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), Error> {
        Ok(())
    }
}
