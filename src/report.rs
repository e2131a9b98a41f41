//! The audit report: one typed slot per task
//!
//! A [`Report`] belongs to exactly one audit run. Each task fills its own
//! slot when it ends; a slot stays `None` when its task was not selected.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::certificate::Certificate;
use crate::cookies::CookieStatus;
use crate::detect::analytics::AnalyticsReport;
use crate::detect::cdn::Cdn;
use crate::detect::fonts::FontsReport;
use crate::detect::forms::Form;
use crate::detect::general::GeneralInfo;
use crate::detect::prefetch::PrefetchHint;
use crate::detect::social::SocialReport;
use crate::detect::videos::Video;
use crate::dns::Addresses;
use crate::recommendations::Recommendation;

/// TLS posture of the site
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "certificate", rename_all = "lowercase")]
pub enum SslReport {
    /// The page is not served over `https`
    Unavailable,
    /// Certificate presented by the site
    Available(Certificate),
}

/// One cookie with its policy outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CookieEntry {
    /// Host that set the cookie
    pub host: String,
    /// Cookie name
    pub name: String,
    /// Expiry, `None` for session cookies
    pub expires: Option<DateTime<Utc>>,
    /// `Secure` attribute
    pub secure: bool,
    /// Expiry policy outcome
    pub status: CookieStatus,
}

/// Cookies set by the page and the third parties it loads
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CookieReport {
    /// Tolerated lifetime in months
    pub threshold_months: u32,
    /// HEAD probes sent to third-party resources
    pub probes: usize,
    /// Every cookie, grouped by host in first-seen order
    pub cookies: Vec<CookieEntry>,
}

impl CookieReport {
    /// Whether any cookie outlives the tolerated lifetime
    pub fn has_flagged(&self) -> bool {
        self.cookies.iter().any(|c| c.status == CookieStatus::Flagged)
    }
}

/// NF Z67-147 metadata describing the audit environment
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NfzReport {
    /// Operating system type and architecture
    pub operating_system: String,
    /// Auditing software name, version and description
    pub software: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// State of the web cache
    pub web_cache: String,
    /// State of the cookie store
    pub web_cookies: String,
    /// Proxy in use
    pub web_proxy: String,
    /// Statement about the auditing machine's integrity
    pub viruses: String,
    /// Local time of the audit
    pub date_time: String,
    /// Public addresses of the auditor
    pub auditor: Addresses,
    /// Addresses of the audited site
    pub website: Addresses,
}

/// Everything found during one audit
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Canonical URL after normalization
    pub url: Option<Url>,
    /// General page information
    pub general: Option<GeneralInfo>,
    /// TLS certificate
    pub ssl: Option<SslReport>,
    /// Web fonts
    pub fonts: Option<FontsReport>,
    /// Social widgets
    pub social: Option<SocialReport>,
    /// DNS prefetching hints
    pub prefetching: Option<Vec<PrefetchHint>>,
    /// Analytics tools
    pub analytics: Option<AnalyticsReport>,
    /// Hosts outside the page domain serving CSS or JS
    pub externals: Option<Vec<String>>,
    /// Content delivery networks
    pub cdn: Option<Vec<Cdn>>,
    /// Embedded videos
    pub videos: Option<Vec<Video>>,
    /// Forms
    pub forms: Option<Vec<Form>>,
    /// Cookies
    pub cookies: Option<CookieReport>,
    /// Audit environment metadata
    pub nfz: Option<NfzReport>,
    /// Recommendations for further human audit
    pub audit: Option<Vec<Recommendation>>,
}

impl Report {
    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_ssl_serializes_as_status() {
        let json = serde_json::to_value(SslReport::Unavailable).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "unavailable" }));
    }

    #[test]
    fn test_empty_report_json() {
        let json: serde_json::Value = serde_json::from_str(&Report::default().to_json().unwrap()).unwrap();
        assert!(json["analytics"].is_null());
        assert!(json["cookies"].is_null());
    }
}
