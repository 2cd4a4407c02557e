//! Shared header helpers.

use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderMap, Method};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Media type of a message, lower-cased and stripped of parameters.
pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(strip_media_type_params)
        .filter(|ct| !ct.is_empty())
}

/// `"application/hal+json; charset=utf-8"` → `"application/hal+json"`.
pub fn strip_media_type_params(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Safe methods never invalidate cached state.
#[inline]
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Whether `Cache-Control` forbids storing the response.
pub fn is_no_store(headers: &HeaderMap) -> bool {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-store"))
}

/// Order-independent signature of a request, used to coalesce refreshes.
///
/// Header names are lower-cased and sorted; repeated headers are merged with
/// `", "` in the order they were appended.
pub fn request_signature(method: &Method, headers: &HeaderMap) -> String {
    let mut merged: BTreeMap<&str, Vec<Cow<'_, str>>> = BTreeMap::new();
    for (name, value) in headers {
        merged
            .entry(name.as_str())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()));
    }

    let mut key = method.as_str().to_string();
    for (name, values) in merged {
        key.push('\n');
        key.push_str(name);
        key.push(':');
        key.push_str(&values.join(", "));
    }
    key
}
