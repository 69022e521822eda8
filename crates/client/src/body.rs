//! Response body parsing.

use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use cachet_core::Error;

use crate::fetch::Response;

/// A parsed response body, as returned to callers and stored in cache entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Text(String),
}

impl Body {
    /// Re-encode for a response synthesized from cache.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Empty => Bytes::new(),
            Body::Json(value) => Bytes::from(serde_json::to_vec(value).unwrap_or_default()),
            Body::Text(text) => Bytes::from(text.clone()),
        }
    }
}

/// True for `application/json` and any `+json` structured suffix.
fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Parse a response body from its status, `Content-Length` and `Content-Type`.
///
/// 204 and zero-length responses are [`Body::Empty`] whatever their declared type.
pub fn parse_body(response: &Response) -> Result<Body, Error> {
    if response.status == StatusCode::NO_CONTENT || response.content_length() == Some(0) || response.bytes.is_empty() {
        return Ok(Body::Empty);
    }

    if response.content_type().is_some_and(is_json) {
        let value = serde_json::from_slice(&response.bytes)
            .map_err(|e| Error::BodyDecode(format!("invalid JSON from {}: {}", response.url, e)))?;
        return Ok(Body::Json(value));
    }

    Ok(Body::Text(response.text()))
}
