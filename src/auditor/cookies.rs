//! Cookie collection: page responses first, then third-party probes.

use reqwest::Method;
use tracing::{debug, info};

use crate::barrier::{JoinBarrier, PendingTag};
use crate::cookies::{CookieJar, classify};
use crate::render;
use crate::report::{CookieEntry, CookieReport};
use crate::tasks::TaskKind;
use crate::types::FetchResult;

use super::{Acquired, AuditRun};

impl AuditRun<'_> {
    /// Collect, probe and classify cookies, then end the `cookies` task
    pub(super) async fn cookies(&mut self, acquired: &Acquired) {
        if !self.tasks.has(TaskKind::Cookies) || self.tasks.is_doing(TaskKind::Cookies) {
            return;
        }
        self.tasks.start(TaskKind::Cookies);

        let now = self.started;
        let months = self.auditor.plan.cookie_threshold_months;

        let mut jar = CookieJar::new();
        let responses = acquired
            .html
            .iter()
            .chain(&acquired.js.resources)
            .chain(&acquired.css.resources);
        for response in responses {
            jar.add(response.host(), response.set_cookies(), now);
        }

        let auditor = self.auditor;
        let fetcher = auditor.fetcher.as_ref();
        let mut barrier: JoinBarrier<'_, FetchResult> = JoinBarrier::new();
        let probes = [
            (
                PendingTag::Analytics,
                self.report.analytics.as_ref().map(|a| a.probe_urls()),
            ),
            (
                PendingTag::Fonts,
                self.report.fonts.as_ref().map(|f| f.probe_urls()),
            ),
            (
                PendingTag::Videos,
                self.report
                    .videos
                    .as_ref()
                    .map(|v| v.iter().map(|video| video.url.clone()).collect()),
            ),
        ];
        for (tag, urls) in probes {
            for url in urls.unwrap_or_default() {
                barrier.issue(tag, async move { fetcher.fetch(&url, Method::HEAD).await });
            }
        }

        let probed = barrier.pending().len();
        info!(probes = probed, "probing third parties for cookies");

        let report = barrier
            .join(
                jar,
                |jar, tag, response| {
                    debug!(?tag, url = %response.url, status = response.status_code, "probe settled");
                    jar.add(response.host(), response.set_cookies(), now);
                },
                |jar| CookieReport {
                    threshold_months: months,
                    probes: probed,
                    cookies: jar
                        .iter()
                        .map(|(host, cookie)| CookieEntry {
                            host: host.to_string(),
                            name: cookie.name.clone(),
                            expires: cookie.expires,
                            secure: cookie.secure,
                            status: classify(cookie.expires, now, months),
                        })
                        .collect(),
                },
            )
            .await;

        if report.has_flagged() {
            self.recommendations.add("Cookies", "expiration delay");
        }
        let section = render::cookies(&report);
        self.report.cookies = Some(report);
        self.end(TaskKind::Cookies, Some(section)).await;
    }
}
