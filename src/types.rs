//! Core types for privacy-audit

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Value of one response header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// Header sent once
    Single(String),
    /// Header sent several times (always used for `set-cookie`)
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// All values of the header, in received order
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(v) => vec![v.as_str()],
            HeaderValue::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Response headers keyed by lower-cased header name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, HeaderValue>);

impl Headers {
    /// Create an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value; repeated names become [`HeaderValue::Multiple`].
    ///
    /// `set-cookie` is always stored as [`HeaderValue::Multiple`], even when
    /// it occurs once.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let always_multiple = name == "set-cookie";
        match self.0.remove(&name) {
            None if always_multiple => {
                self.0.insert(name, HeaderValue::Multiple(vec![value]));
            }
            None => {
                self.0.insert(name, HeaderValue::Single(value));
            }
            Some(HeaderValue::Single(first)) => {
                self.0.insert(name, HeaderValue::Multiple(vec![first, value]));
            }
            Some(HeaderValue::Multiple(mut values)) => {
                values.push(value);
                self.0.insert(name, HeaderValue::Multiple(values));
            }
        }
    }

    /// Look up a header by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.get(&name.to_ascii_lowercase())
    }

    /// Every `Set-Cookie` value, in received order
    pub fn set_cookies(&self) -> Vec<&str> {
        self.get("set-cookie")
            .map(HeaderValue::values)
            .unwrap_or_default()
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no header was received
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&reqwest::header::HeaderMap> for Headers {
    fn from(map: &reqwest::header::HeaderMap) -> Self {
        let mut headers = Headers::new();
        for (name, value) in map {
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        headers
    }
}

/// One retrieved resource.
///
/// Always carries a status: a request that failed before any response has
/// `status_code == 0`, no content, no headers, and the transport error as
/// `status_message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Absolute URL, after redirects when a response was received
    pub url: Url,
    /// Response body
    pub content: Option<String>,
    /// Response headers
    pub headers: Option<Headers>,
    /// HTTP status code (0 = no response)
    pub status_code: u16,
    /// Reason phrase, or the transport error
    pub status_message: String,
}

impl FetchResult {
    /// Result for a request that never produced a response
    pub fn transport_failure(url: Url, message: impl Into<String>) -> Self {
        Self {
            url,
            content: None,
            headers: None,
            status_code: 0,
            status_message: message.into(),
        }
    }

    /// Whether a response with a non-error status was received
    pub fn is_success(&self) -> bool {
        (1..400).contains(&self.status_code)
    }

    /// Host part of the URL (empty for host-less URLs)
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Body text, or an empty string when the resource was unavailable
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// `Set-Cookie` values of a usable response.
    ///
    /// Failed requests and error statuses contribute no cookies.
    pub fn set_cookies(&self) -> Vec<&str> {
        if !self.is_success() {
            return Vec::new();
        }
        self.headers
            .as_ref()
            .map(Headers::set_cookies)
            .unwrap_or_default()
    }
}

/// Outcome of a sequential fetch over a resource list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchBatch {
    /// The list was empty; nothing was requested
    Empty,
    /// Results in list order
    Fetched(Vec<FetchResult>),
}

impl FetchBatch {
    /// Normalize to a plain (possibly empty) list
    pub fn into_vec(self) -> Vec<FetchResult> {
        match self {
            FetchBatch::Empty => Vec::new(),
            FetchBatch::Fetched(results) => results,
        }
    }
}

/// Fetched external resources of one kind plus same-document inline code
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    /// External resources, in document order
    pub resources: Vec<FetchResult>,
    /// Inline `<script>` or `<style>` bodies, in document order
    pub inline: Vec<String>,
}

impl ResourceSet {
    /// Every text to scan: external bodies first, then inline code
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.resources
            .iter()
            .map(FetchResult::text)
            .chain(self.inline.iter().map(String::as_str))
    }

    /// URLs of the external resources
    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.resources.iter().map(|r| &r.url)
    }
}
