//! Report slices, generated in render order from the acquired snapshot.

use tracing::debug;

use crate::detect::{analytics, cdn, fonts, forms, general, prefetch, social, videos};
use crate::render;
use crate::report::SslReport;
use crate::tasks::TaskKind;
use crate::types::ResourceSet;

use super::{Acquired, AuditRun};

/// Hosts serving stylesheets or scripts other than the page host, without duplicates
pub(crate) fn external_hosts(page_host: &str, css: &ResourceSet, js: &ResourceSet) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for url in js.urls().chain(css.urls()) {
        let host = url.host_str().unwrap_or_default();
        if host != page_host && !hosts.iter().any(|h| h == host) {
            hosts.push(host.to_string());
        }
    }
    hosts
}

impl AuditRun<'_> {
    /// Run every scheduled generator, cookies last
    pub(super) async fn generate(&mut self, acquired: &Acquired) {
        let host = acquired.host();

        if self.tasks.has(TaskKind::General) {
            self.tasks.start(TaskKind::General);
            let info = general::detect(&acquired.page, &acquired.url, &acquired.css, &acquired.js);
            let section = render::general(&info);
            self.report.general = Some(info);
            self.end(TaskKind::General, Some(section)).await;
        }

        if let Some(ssl) = acquired.ssl.clone() {
            if ssl == SslReport::Unavailable {
                self.recommendations.add(
                    "Security",
                    "available SSL certificate (it is mandatory that data is transmitted loud & clear)",
                );
            }
            let section = render::ssl(&ssl);
            self.report.ssl = Some(ssl);
            self.end(TaskKind::Ssl, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Fonts) {
            self.tasks.start(TaskKind::Fonts);
            let found = fonts::detect(&acquired.css, &acquired.js, &acquired.url);
            if found.has_third_party() {
                self.recommendations.add("Third party", "fonts");
            }
            let section = render::fonts(&found);
            self.report.fonts = Some(found);
            self.end(TaskKind::Fonts, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Social) {
            self.tasks.start(TaskKind::Social);
            let found = social::detect(&acquired.js);
            for (_, _, key) in found.widgets() {
                self.recommendations.add("Social medias", key);
            }
            let section = render::social(&found);
            self.report.social = Some(found);
            self.end(TaskKind::Social, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Prefetching) {
            self.tasks.start(TaskKind::Prefetching);
            let hints = prefetch::explain_all(&acquired.page.prefetch);
            if !hints.is_empty() {
                self.recommendations.add("Third party", "DNS Prefetching");
            }
            let section = render::prefetching(host, &hints);
            self.report.prefetching = Some(hints);
            self.end(TaskKind::Prefetching, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Analytics) {
            self.tasks.start(TaskKind::Analytics);
            let found = analytics::detect(
                &acquired.js,
                acquired.url.scheme(),
                self.started.timestamp(),
            );
            if !found.is_empty() {
                self.recommendations.add("Third party", "analytics - web statistics");
            }
            let section = render::analytics(host, &found);
            self.report.analytics = Some(found);
            self.end(TaskKind::Analytics, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Externals) {
            self.tasks.start(TaskKind::Externals);
            let hosts = external_hosts(host, &acquired.css, &acquired.js);
            if !hosts.is_empty() {
                self.recommendations.add("External dependencies", "such as CSS & JS");
            }
            let section = render::externals(&hosts);
            self.report.externals = Some(hosts);
            self.end(TaskKind::Externals, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Cdn) {
            self.tasks.start(TaskKind::Cdn);
            let found = cdn::detect(&acquired.css, &acquired.js);
            if !found.is_empty() {
                self.recommendations.add("Third Party", "Content Delivery Networks");
            }
            let section = render::cdn(host, &found);
            self.report.cdn = Some(found);
            self.end(TaskKind::Cdn, Some(section)).await;
        }

        let html = acquired.page_text();

        if self.tasks.has(TaskKind::Videos) {
            self.tasks.start(TaskKind::Videos);
            let found = videos::detect(html);
            if !found.is_empty() {
                self.recommendations.add("External videos", "embedded");
            }
            let section = render::videos(&found);
            self.report.videos = Some(found);
            self.end(TaskKind::Videos, Some(section)).await;
        }

        if self.tasks.has(TaskKind::Forms) {
            self.tasks.start(TaskKind::Forms);
            let found = forms::detect(html);
            if !found.is_empty() {
                self.recommendations.add(
                    "Forms",
                    "the webpage contains forms, check for their GDPR compliance (legal basis, consent...)",
                );
            }
            let section = render::forms(&found);
            self.report.forms = Some(found);
            self.end(TaskKind::Forms, Some(section)).await;
        }

        self.cookies(acquired).await;
        debug!(remaining = ?self.tasks.active(), "generators done");
    }
}
