//! Analytics and marketing trackers
//!
//! Recognizes Google Analytics (`analytics.js` and the legacy `ga.js`
//! snippet), Google Tag Manager / gtag.js, Matomo (formerly Piwik), Plezi
//! and WordPress.com Stats (Jetpack).

use serde::Serialize;
use url::Url;

use super::{capture_or_empty, captures, is_match};
use crate::types::ResourceSet;

/// Google Analytics snippet generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetKind {
    /// `analytics.js`
    Standard,
    /// `ga.js`, deprecated
    Legacy,
}

/// Google Analytics configuration found in an inline snippet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoogleAnalytics {
    /// Tracking id such as `UA-12345-6` (empty if not found)
    pub property_id: String,
    /// IP anonymization enabled
    pub anonymize_ip: bool,
    /// Forced SSL transport enabled
    pub force_ssl: bool,
    /// Snippet generation
    #[serde(rename = "type")]
    pub kind: SnippetKind,
}

/// gtag.js configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagManager {
    /// Id passed to `gtag('config', ...)` (empty if not found)
    pub property_id: String,
    /// `'anonymize_ip': true` passed to the config call
    pub anonymize_ip: bool,
}

/// Tracker hosted on its own endpoint (Matomo, Plezi)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostedTracker {
    /// Tracker endpoint, when it could be extracted
    pub url: Option<Url>,
    /// Site id registered with the tracker (empty if not found)
    pub site_id: String,
}

/// Every analytics tool found on the page
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    /// Google Analytics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ga: Option<GoogleAnalytics>,
    /// Google Tag Manager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtag: Option<TagManager>,
    /// Matomo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piwik: Option<HostedTracker>,
    /// Plezi marketing automation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plezi: Option<HostedTracker>,
    /// WordPress.com Stats
    pub wordpress: bool,
}

impl AnalyticsReport {
    /// Whether no tool was found
    pub fn is_empty(&self) -> bool {
        self.ga.is_none()
            && self.gtag.is_none()
            && self.piwik.is_none()
            && self.plezi.is_none()
            && !self.wordpress
    }

    /// Tracker endpoints worth probing for cookies
    pub fn probe_urls(&self) -> Vec<Url> {
        [&self.piwik, &self.plezi]
            .into_iter()
            .flatten()
            .filter_map(|tracker| tracker.url.clone())
            .collect()
    }
}

/// Scan scripts for analytics tools.
///
/// `scheme` is the page scheme (`http` or `https`), used to complete
/// protocol-relative tracker endpoints. `timestamp` is the current Unix
/// time, which Plezi embeds in its event URL.
pub fn detect(js: &ResourceSet, scheme: &str, timestamp: i64) -> AnalyticsReport {
    AnalyticsReport {
        ga: google_analytics(&js.inline),
        gtag: tag_manager(js),
        piwik: matomo(&js.inline, scheme),
        plezi: plezi(&js.inline, scheme, timestamp),
        wordpress: js.urls().any(|u| u.as_str().contains("stats.wp.com")),
    }
}

fn google_analytics(inline: &[String]) -> Option<GoogleAnalytics> {
    let create_call = pattern!(r#"\(\s*['"]create['"].*\)"#);
    let property = pattern!(r"UA-\d+-\d+");
    let anonymize = pattern!(r#"['"]anonymizeIp['"]\s*,\s*true"#);
    let force_ssl = pattern!(r#"['"]forceSSL['"]\s*,\s*true"#);

    // A later snippet overrides an earlier one
    let mut found = None;
    for script in inline {
        if script.contains("google-analytics.com/analytics.js") && is_match(create_call, script) {
            found = Some(GoogleAnalytics {
                property_id: capture_or_empty(property, script, 0),
                anonymize_ip: is_match(anonymize, script),
                force_ssl: is_match(force_ssl, script),
                kind: SnippetKind::Standard,
            });
        } else if script.contains("google-analytics.com/ga.js") && script.contains("_gaq.push") {
            found = Some(GoogleAnalytics {
                property_id: capture_or_empty(property, script, 0),
                anonymize_ip: script.contains("_gat._anonymizeIp"),
                force_ssl: script.contains("_gat._forceSSL"),
                kind: SnippetKind::Legacy,
            });
        }
    }
    found
}

fn tag_manager(js: &ResourceSet) -> Option<TagManager> {
    let loader = pattern!(r"googletagmanager\.com/gtag");
    if !js.urls().any(|u| is_match(loader, u.as_str())) {
        return None;
    }

    let config_call = pattern!(r#"gtag\(\s*['"]config['"].*\)"#);
    let property = pattern!(r"UA-\d+-\d+|G-[A-Z0-9]+");
    let anonymize = pattern!(r#"['"]anonymize_ip['"]\s*:\s*true"#);

    let mut entry = TagManager {
        property_id: String::new(),
        anonymize_ip: false,
    };
    for script in &js.inline {
        if let Some(call) = captures(config_call, script).and_then(|c| c.get(0)) {
            entry.property_id = capture_or_empty(property, call.as_str(), 0);
            entry.anonymize_ip = is_match(anonymize, call.as_str());
        }
    }
    Some(entry)
}

fn matomo(inline: &[String], scheme: &str) -> Option<HostedTracker> {
    let tracker_call = pattern!(r#"u\s*\+\s*['"](?:piwik|matomo)\.php['"]"#);
    let base = pattern!(r#"var\s+u\s*=\s*["']([^"']+)["']"#);
    let site = pattern!(r#"_paq\.push\(\[\s*['"]setSiteId['"]\s*,\s*['"]?([^'"\]\s]+)"#);

    let script = inline.iter().rev().find(|s| is_match(tracker_call, s))?;
    Some(HostedTracker {
        url: captures(base, script)
            .and_then(|c| c.get(1))
            .and_then(|m| absolute(m.as_str(), scheme)),
        site_id: capture_or_empty(site, script, 1),
    })
}

fn plezi(inline: &[String], scheme: &str, timestamp: i64) -> Option<HostedTracker> {
    let marker = pattern!(r#""?pageUriSEO"?\s*:\s*"plezi""#);
    let loader = pattern!(r"src='(\\/\\/www\.link-page\.info\\/tracking_(\d+)\.js)'");

    if !inline.iter().any(|s| is_match(marker, s)) {
        return None;
    }

    let mut entry = HostedTracker {
        url: None,
        site_id: String::new(),
    };
    for script in inline {
        let Some(caps) = captures(loader, script) else {
            continue;
        };
        let site_id = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        // The tracking script answers on a per-event path; probing it is what sets cookies
        let event = format!(
            "//www.link-page.info/tracking_{site_id}/{timestamp}/MayBeNot/GDPR/Compliant/Testing/event_42.js"
        );
        entry.url = absolute(&event, scheme);
        entry.site_id = site_id.to_string();
    }
    Some(entry)
}

fn absolute(reference: &str, scheme: &str) -> Option<Url> {
    if reference.starts_with("//") {
        Url::parse(&format!("{scheme}:{reference}")).ok()
    } else {
        Url::parse(reference).ok()
    }
}
