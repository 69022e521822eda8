//! Bridging between header multimaps and the policy's header object.
//!
//! Internally headers are always a [`HeaderMap`], which keeps repeated names
//! (`set-cookie`, `link`, ...) in order. The policy evaluator persists headers
//! as a name → value-or-list object; singleton lists collapse to a scalar only
//! in that object, and expanding it back restores every value.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// One header's value(s) in the persisted object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderField {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderField {
    pub fn values(&self) -> &[String] {
        match self {
            HeaderField::Single(value) => std::slice::from_ref(value),
            HeaderField::Multiple(values) => values,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }

    /// All values joined as a list header (`a, b`).
    pub fn joined(&self) -> String {
        self.values().join(", ")
    }
}

/// Lower-cased header name → value(s), ordered by name.
pub type HeaderObject = BTreeMap<String, HeaderField>;

/// Collapse a header multimap into the object form.
pub fn to_header_object(headers: &HeaderMap) -> HeaderObject {
    let mut object = HeaderObject::new();
    for name in headers.keys() {
        let mut values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|v| match v.to_str() {
                Ok(value) => value.to_string(),
                Err(_) => {
                    tracing::debug!(name = %name, "header value is not visible ASCII, storing lossy UTF-8");
                    String::from_utf8_lossy(v.as_bytes()).into_owned()
                }
            })
            .collect();
        let field = if values.len() == 1 {
            HeaderField::Single(values.remove(0))
        } else {
            HeaderField::Multiple(values)
        };
        object.insert(name.as_str().to_string(), field);
    }
    object
}

/// Expand the object form back into a multimap.
///
/// Names or values that are not valid HTTP tokens are dropped with a debug log;
/// they can only come from a hand-edited or foreign policy.
pub fn from_header_object(object: &HeaderObject) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, field) in object {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::debug!(name = %name, "dropping invalid stored header name");
            continue;
        };
        for value in field.values() {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(header_name.clone(), value);
                }
                Err(_) => tracing::debug!(name = %name, "dropping invalid stored header value"),
            }
        }
    }
    headers
}

/// Overlay `overrides` on `base`: every name present in `overrides` replaces
/// all of its values in `base`; other names are kept as they are.
pub fn merge_headers(base: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = base.clone();
    for name in overrides.keys() {
        merged.remove(name);
        for value in overrides.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}
