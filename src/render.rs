//! Human-readable sections built from report slices
//!
//! Rendering is pure: each function turns one slice into a [`Section`] made
//! of semantic [`Line`]s. Styling is left to the [`ReportSink`](crate::output::ReportSink).

use serde::Serialize;

use crate::cookies::CookieStatus;
use crate::detect::analytics::{AnalyticsReport, SnippetKind};
use crate::detect::cdn::Cdn;
use crate::detect::fonts::FontsReport;
use crate::detect::forms::Form;
use crate::detect::general::GeneralInfo;
use crate::detect::prefetch::PrefetchHint;
use crate::detect::social::SocialReport;
use crate::detect::videos::Video;
use crate::recommendations::Recommendation;
use crate::report::{CookieReport, NfzReport, SslReport};

/// One output line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Line {
    /// Free text
    Info {
        /// Text
        text: String,
    },
    /// `label: value` pair
    Item {
        /// Left column
        label: String,
        /// Right column
        value: String,
    },
    /// Table row; flagged rows are highlighted
    Row {
        /// Cell texts
        cells: Vec<String>,
        /// Draw attention to this row
        flagged: bool,
    },
    /// Something the reader should act on
    Warning {
        /// Text
        text: String,
    },
    /// A check that could not be performed
    Error {
        /// Text
        text: String,
    },
}

impl Line {
    fn info(text: impl Into<String>) -> Self {
        Line::Info { text: text.into() }
    }

    fn item(label: impl Into<String>, value: impl Into<String>) -> Self {
        Line::Item {
            label: label.into(),
            value: value.into(),
        }
    }

    fn row(cells: impl IntoIterator<Item = impl Into<String>>, flagged: bool) -> Self {
        Line::Row {
            cells: cells.into_iter().map(Into::into).collect(),
            flagged,
        }
    }
}

/// Headline plus lines
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Headline
    pub title: String,
    /// Body
    pub lines: Vec<Line>,
}

impl Section {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    fn push(&mut self, line: Line) -> &mut Self {
        self.lines.push(line);
        self
    }

    /// All text of the section, for searching in tests and logs
    pub fn text(&self) -> String {
        let mut out = self.title.clone();
        for line in &self.lines {
            out.push('\n');
            match line {
                Line::Info { text } | Line::Warning { text } | Line::Error { text } => {
                    out.push_str(text)
                }
                Line::Item { label, value } => {
                    out.push_str(label);
                    out.push_str(": ");
                    out.push_str(value);
                }
                Line::Row { cells, .. } => out.push_str(&cells.join(" | ")),
            }
        }
        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

fn numbered(i: usize) -> String {
    format!("{}.", i + 1)
}

/// General Information
pub fn general(info: &GeneralInfo) -> Section {
    let mut s = Section::new("General Information");
    s.push(Line::item("Title", &info.title));
    if !info.description.is_empty() {
        s.push(Line::item("Description", &info.description));
    }
    s.push(Line::item("URL", info.url.as_str()));
    let software = if info.generators.is_empty() {
        "Unknown".to_string()
    } else {
        info.generators.join(", ")
    };
    s.push(Line::item("Software", software));
    if info.is_wordpress() {
        if let Some(theme) = info.theme.as_deref().filter(|t| !t.is_empty()) {
            s.push(Line::item("Theme", theme));
        }
        if !info.plugins.is_empty() {
            s.push(Line::item("Plugins", info.plugins.join(", ")));
        }
    }
    s
}

/// SSL Certificate
pub fn ssl(report: &SslReport) -> Section {
    let mut s = Section::new("SSL Certificate");
    match report {
        SslReport::Unavailable => {
            s.push(Line::Error {
                text: "There is no SSL/TLS available.".into(),
            });
        }
        SslReport::Available(cert) => {
            s.push(Line::item("Common Name", &cert.subject_cn))
                .push(Line::item("Country", &cert.issuer_country))
                .push(Line::item("Organization", &cert.issuer_organization))
                .push(Line::item("Organization CN", &cert.issuer_cn))
                .push(Line::item("Valid from", cert.valid_from.to_rfc2822()))
                .push(Line::item("Valid to", cert.valid_to.to_rfc2822()))
                .push(Line::item("Serial Number", &cert.serial_number))
                .push(Line::item("FP SHA-1", &cert.fingerprint))
                .push(Line::item("FP SHA-256", &cert.fingerprint256));
        }
    }
    s
}

/// Fonts Implementation
pub fn fonts(report: &FontsReport) -> Section {
    let mut s = Section::new("Fonts Implementation");
    if report.is_empty() {
        s.push(Line::info("There were no Fonts found."));
        return s;
    }
    for group in &report.groups {
        s.push(Line::info(format!(
            "{}: {}",
            group.provider.description(),
            group.families.len()
        )));
        for (i, family) in group.families.iter().enumerate() {
            s.push(Line::row(
                [numbered(i), family.name.clone(), family.styles.join(", ")],
                false,
            ));
        }
    }
    s
}

/// Social Medias
pub fn social(report: &SocialReport) -> Section {
    let mut s = Section::new("Social Medias");
    let widgets = report.widgets();
    if widgets.is_empty() {
        s.push(Line::info("No social media detected."));
    }
    for (network, widget, _) in widgets {
        s.push(Line::item(network, widget));
    }
    s
}

/// DNS Prefetching
pub fn prefetching(host: &str, hints: &[PrefetchHint]) -> Section {
    let mut s = Section::new("DNS Prefetching");
    if hints.is_empty() {
        s.push(Line::info(format!("{host} supports no DNS prefetching.")));
        return s;
    }
    s.push(Line::info(format!(
        "{host} has {} DNS prefetching elements.",
        hints.len()
    )));
    for (i, hint) in hints.iter().enumerate() {
        s.push(Line::row(
            [
                numbered(i),
                hint.target.clone(),
                hint.explanation.unwrap_or_default().to_string(),
            ],
            false,
        ));
    }
    s
}

/// Analytics
pub fn analytics(host: &str, report: &AnalyticsReport) -> Section {
    let mut s = Section::new("Analytics");
    if let Some(ga) = &report.ga {
        s.push(Line::info("Google Analytics has been found."))
            .push(Line::item("Property ID", &ga.property_id))
            .push(Line::item("Anonymized IP", yes_no(ga.anonymize_ip)))
            .push(Line::item("Force SSL", yes_no(ga.force_ssl)));
        if ga.kind == SnippetKind::Legacy {
            s.push(Line::Warning {
                text: format!("{host} uses the legacy ga.js code snippet (deprecated)."),
            });
        }
    }
    if let Some(gtag) = &report.gtag {
        s.push(Line::info("The Google Tag Manager has been found."))
            .push(Line::item("Property ID", &gtag.property_id))
            .push(Line::item("Anonymized IP", yes_no(gtag.anonymize_ip)));
    }
    if let Some(piwik) = &report.piwik {
        s.push(Line::info("Matomo has been found."))
            .push(Line::item(
                "Matomo URL",
                piwik.url.as_ref().map(|u| u.as_str()).unwrap_or_default(),
            ))
            .push(Line::item("Site ID", &piwik.site_id));
    }
    if report.wordpress {
        s.push(Line::info("The WordPress Stats (Jetpack) has been found."));
    }
    if let Some(plezi) = &report.plezi {
        s.push(Line::info("The Plezi marketing automation has been found."));
        if let Some(url) = &plezi.url {
            s.push(Line::item("Plezi URL", url.as_str()));
        }
        if !plezi.site_id.is_empty() {
            s.push(Line::item("Site ID", &plezi.site_id));
        }
    }
    if report.is_empty() {
        s.push(Line::info("No Analytics Tool has been found."));
    }
    s
}

/// Direct external resources required
pub fn externals(hosts: &[String]) -> Section {
    let mut s = Section::new("Direct external resources required");
    if hosts.is_empty() {
        s.push(Line::info("No external resource is required."));
    }
    for host in hosts {
        s.push(Line::row([host.as_str(), "is out of the current page domain"], false));
    }
    s
}

/// Content Delivery Networks
pub fn cdn(host: &str, cdns: &[Cdn]) -> Section {
    let mut s = Section::new("Content Delivery Networks");
    if cdns.is_empty() {
        s.push(Line::info("No Content Delivery Networks have been found."));
        return s;
    }
    s.push(Line::info(format!(
        "{host} uses {} Content Delivery Networks.",
        cdns.len()
    )));
    for (i, cdn) in cdns.iter().enumerate() {
        s.push(Line::row(
            [numbered(i), cdn.host.to_string(), cdn.description.to_string()],
            false,
        ));
    }
    s
}

/// External videos
pub fn videos(videos: &[Video]) -> Section {
    let mut s = Section::new("External videos");
    if videos.is_empty() {
        s.push(Line::info("No external video found."));
    }
    for video in videos {
        s.push(Line::item(video.provider.to_string(), "is present"));
    }
    s
}

/// Forms
pub fn forms(forms: &[Form]) -> Section {
    let mut s = Section::new("Forms");
    if forms.is_empty() {
        s.push(Line::item("No form found", "Nothing to check out"));
    }
    for form in forms {
        let destination = if form.action.is_empty() {
            "(this page)"
        } else {
            form.action.as_str()
        };
        s.push(Line::item("Form found", format!("Destination: {destination}")));
    }
    s
}

/// Cookies
pub fn cookies(report: &CookieReport) -> Section {
    let mut s = Section::new("Cookies");
    if report.cookies.is_empty() {
        s.push(Line::item("No cookie set", "Nothing to check out"));
        return s;
    }
    for cookie in &report.cookies {
        let expires = match cookie.expires {
            Some(at) => at.format("%Y-%m-%d").to_string(),
            None => "end of session".to_string(),
        };
        let secure = if cookie.secure { "secure" } else { "unsecure" };
        s.push(Line::row(
            [cookie.host.clone(), cookie.name.clone(), expires, secure.to_string()],
            cookie.status == CookieStatus::Flagged,
        ));
    }
    s
}

/// NF Z67-147 informations about the current audit
pub fn nfz(report: &NfzReport) -> Section {
    let mut s = Section::new("NF Z67-147 informations about the current audit");
    s.push(Line::item("Operating system", &report.operating_system))
        .push(Line::item("Software", &report.software))
        .push(Line::item("User Agent", &report.user_agent))
        .push(Line::item("Web cache", &report.web_cache))
        .push(Line::item("Web cookies", &report.web_cookies))
        .push(Line::item("Web proxy", &report.web_proxy))
        .push(Line::item("Viruses", &report.viruses))
        .push(Line::item("Date & time", &report.date_time));

    let join = |addrs: &[std::net::IpAddr]| {
        addrs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let addresses = [
        ("Auditor's IPv4", &report.auditor.v4),
        ("Auditor's IPv6", &report.auditor.v6),
        ("Website IPv4", &report.website.v4),
        ("Website IPv6", &report.website.v6),
    ];
    for (label, addrs) in addresses {
        if let Some(addrs) = addrs {
            s.push(Line::item(label, join(addrs)));
        }
    }
    s
}

/// Recommendations for further human audit
pub fn audit(recommendations: &[Recommendation]) -> Section {
    let mut s = Section::new("Recommendations for further human audit");
    if recommendations.is_empty() {
        s.push(Line::info("Nothing to recommend."));
    }
    for rec in recommendations {
        for warning in &rec.warnings {
            s.push(Line::item(&rec.topic, format!("Check {warning}")));
        }
    }
    s
}
