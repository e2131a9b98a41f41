//! Single-attempt HTTP retrieval of page resources
//!
//! A fetch never fails: whatever happens on the wire ends up in a
//! [`FetchResult`]. Callers look at `status_code` to decide how to degrade.

use async_trait::async_trait;
use reqwest::Method;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::types::{FetchResult, Headers};

/// User agent announced to audited sites unless configured otherwise
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/66.0.3359.139 Safari/537.36";

/// Retrieves one resource per call
///
/// Implementations must not retry and must encode every failure in the
/// returned [`FetchResult`] instead of panicking or erroring.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Request `url` with `method` (GET for content, HEAD for cookie probes)
    async fn fetch(&self, url: &Url, method: Method) -> FetchResult;

    /// User agent sent with every request
    fn user_agent(&self) -> &str;
}

/// [`Fetcher`] backed by a shared `reqwest` client
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Build a client announcing `user_agent`, with an optional per-request timeout
    ///
    /// Redirects are followed with reqwest's default policy.
    ///
    /// # Errors
    /// Returns [`Error::Network`](crate::error::Error::Network) if the client
    /// cannot be created (e.g. the TLS backend fails to initialize).
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            user_agent: user_agent.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, method: Method) -> FetchResult {
        let response = match self.client.request(method.clone(), url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let result = failure(url, &e);
                warn!(%url, %method, status = result.status_code, error = %e, "request failed");
                return result;
            }
        };

        let final_url = response.url().clone();
        let status = response.status();
        let headers = Headers::from(response.headers());
        let status_message = status.canonical_reason().unwrap_or_default().to_string();

        let content = match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = %final_url, error = %e, "failed to read response body");
                None
            }
        };

        debug!(url = %final_url, %method, status = status.as_u16(), "fetched");

        FetchResult {
            url: final_url,
            content,
            headers: Some(headers),
            status_code: status.as_u16(),
            status_message,
        }
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

fn failure(url: &Url, error: &reqwest::Error) -> FetchResult {
    let mut result = FetchResult::transport_failure(url.clone(), error.to_string());
    if let Some(status) = error.status() {
        result.status_code = status.as_u16();
    }
    result
}

/// Resolve a reference found in a page against the page URL.
///
/// Protocol-relative references (`//host/path`) inherit the page scheme.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    base.join(reference).ok()
}
