//! Sequential content acquisition: normalize, html, css, js, ssl.

use reqwest::Method;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::Result;
use crate::parser::ParsedPage;
use crate::report::SslReport;
use crate::tasks::TaskKind;
use crate::types::{FetchBatch, FetchResult, ResourceSet};

use super::{AuditRun, Auditor};

/// Everything fetched for one audit, read-only once acquisition ends
#[derive(Clone, Debug)]
pub struct Acquired {
    /// Canonical page URL
    pub url: Url,
    /// Main document response, `None` when `html` was not scheduled
    pub html: Option<FetchResult>,
    /// Main document, parsed once
    pub page: ParsedPage,
    /// Linked stylesheets plus `<style>` bodies
    pub css: ResourceSet,
    /// External scripts plus inline `<script>` bodies
    pub js: ResourceSet,
    /// Certificate outcome, `None` when `ssl` was not scheduled
    pub ssl: Option<SslReport>,
}

impl Acquired {
    /// Host of the canonical URL
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Main document body, empty when it was not fetched
    pub fn page_text(&self) -> &str {
        self.html.as_ref().map(FetchResult::text).unwrap_or_default()
    }
}

impl Auditor {
    /// Fetch `urls` one at a time, results in list order
    pub(crate) async fn process_multiple_items(&self, urls: &[Url]) -> FetchBatch {
        if urls.is_empty() {
            return FetchBatch::Empty;
        }

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let result = self.fetcher.fetch(url, Method::GET).await;
            debug!(url = %result.url, status = result.status_code, "fetched resource");
            results.push(result);
        }
        FetchBatch::Fetched(results)
    }
}

impl AuditRun<'_> {
    /// Run every acquisition stage in order
    pub(super) async fn acquire(&mut self) -> Result<Acquired> {
        let url = self.normalize().await;
        let (html, page) = self.html(&url).await;

        let css = self
            .resources(TaskKind::Css, &page.stylesheet_urls, &page.inline_css)
            .await;
        let js = self
            .resources(TaskKind::Js, &page.script_urls, &page.inline_js)
            .await;

        let ssl = self.ssl(&url).await?;

        Ok(Acquired {
            url,
            html,
            page,
            css,
            js,
            ssl,
        })
    }

    /// Resolve the input to the URL the site actually serves
    async fn normalize(&mut self) -> Url {
        let start = self.auditor.plan.start.clone();
        self.tasks.start(TaskKind::Normalize);
        info!(url = %start, "normalizing URL");

        let response = self.auditor.fetcher.fetch(&start, Method::GET).await;
        let url = if response.status_code == 0 {
            warn!(
                url = %start,
                reason = %response.status_message,
                "site unreachable, keeping the input URL"
            );
            start
        } else {
            response.url
        };

        debug!(url = %url, "canonical URL");
        self.report.url = Some(url.clone());
        self.end(TaskKind::Normalize, None).await;
        url
    }

    async fn html(&mut self, url: &Url) -> (Option<FetchResult>, ParsedPage) {
        if !self.tasks.has(TaskKind::Html) {
            return (None, ParsedPage::default());
        }
        self.tasks.start(TaskKind::Html);
        info!(url = %url, "fetching main document");

        let response = self.auditor.fetcher.fetch(url, Method::GET).await;
        debug!(url = %response.url, status = response.status_code, "fetched main document");
        let page = ParsedPage::parse(response.text(), url);

        self.end(TaskKind::Html, None).await;
        (Some(response), page)
    }

    async fn resources(&mut self, task: TaskKind, urls: &[Url], inline: &[String]) -> ResourceSet {
        if !self.tasks.has(task) {
            return ResourceSet::default();
        }
        self.tasks.start(task);
        info!(%task, count = urls.len(), "fetching resources");

        let resources = self.auditor.process_multiple_items(urls).await.into_vec();
        self.end(task, None).await;

        ResourceSet {
            resources,
            inline: inline.to_vec(),
        }
    }

    /// Retrieve the certificate when the page is served over `https`
    async fn ssl(&mut self, url: &Url) -> Result<Option<SslReport>> {
        if !self.tasks.has(TaskKind::Ssl) {
            return Ok(None);
        }
        self.tasks.start(TaskKind::Ssl);

        if url.scheme() != "https" {
            info!(url = %url, "page is not served over https");
            return Ok(Some(SslReport::Unavailable));
        }

        let host = url.host_str().unwrap_or_default();
        info!(host, "retrieving certificate");
        match self.auditor.certificates.certificate(host).await {
            Ok(certificate) => Ok(Some(SslReport::Available(certificate))),
            Err(e) => {
                error!(host, error = %e, "certificate retrieval failed");
                Err(e)
            }
        }
    }
}
