//! `Set-Cookie` parsing, the per-host cookie jar, and the expiry policy

use chrono::{DateTime, Duration, Months, NaiveDateTime, Utc};
use serde::Serialize;

/// Default tolerated cookie lifetime, in months
pub const DEFAULT_THRESHOLD_MONTHS: u32 = 13;

/// One cookie as announced by a response
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Absolute expiry, `None` for session cookies
    pub expires: Option<DateTime<Utc>>,
    /// `Secure` attribute present
    pub secure: bool,
}

impl Cookie {
    /// Parse one `Set-Cookie` header value.
    ///
    /// `Max-Age` wins over `Expires`. Returns `None` when the value has no
    /// cookie name.
    pub fn parse(header: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, _) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut expires = None;
        let mut max_age = None;
        let mut secure = false;
        for attr in parts {
            let (key, value) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "expires" => expires = parse_cookie_date(value),
                "max-age" => max_age = value.parse::<i64>().ok().map(|secs| expiry_after(now, secs)),
                "secure" => secure = true,
                _ => {}
            }
        }

        Some(Self {
            name: name.to_string(),
            expires: max_age.or(expires),
            secure,
        })
    }
}

/// `now + secs`, saturating at the representable date range
fn expiry_after(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    let bound = if secs < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };
    Duration::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(bound)
}

/// Parse an `Expires` attribute
///
/// Accepts RFC 1123 dates and the dashed Netscape form
/// (`Wed, 21-Oct-2015 07:28:00 GMT`).
pub fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    let undashed = value.replace('-', " ");
    if let Ok(date) = DateTime::parse_from_rfc2822(&undashed) {
        return Some(date.with_timezone(&Utc));
    }
    ["%a, %d %b %Y %H:%M:%S GMT", "%A, %d %b %y %H:%M:%S GMT"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&undashed, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Cookies grouped by the host that set them, in first-seen order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CookieJar {
    hosts: Vec<(String, Vec<Cookie>)>,
}

impl CookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store every `Set-Cookie` value received from `host`
    pub fn add<'h>(
        &mut self,
        host: &str,
        headers: impl IntoIterator<Item = &'h str>,
        now: DateTime<Utc>,
    ) {
        let parsed: Vec<_> = headers
            .into_iter()
            .filter_map(|h| Cookie::parse(h, now))
            .collect();
        if parsed.is_empty() {
            return;
        }
        match self.hosts.iter_mut().find(|(h, _)| h == host) {
            Some((_, cookies)) => cookies.extend(parsed),
            None => self.hosts.push((host.to_string(), parsed)),
        }
    }

    /// Total number of cookies
    pub fn count(&self) -> usize {
        self.hosts.iter().map(|(_, c)| c.len()).sum()
    }

    /// `(host, cookie)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cookie)> {
        self.hosts
            .iter()
            .flat_map(|(host, cookies)| cookies.iter().map(move |c| (host.as_str(), c)))
    }
}

/// Outcome of the expiry policy for one cookie
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieStatus {
    /// No expiry, removed at the end of the session
    Session,
    /// Expires within the tolerated lifetime
    Compliant,
    /// Outlives the tolerated lifetime
    Flagged,
}

/// Latest acceptable expiry: `now + months + 1 hour`
pub fn expiry_threshold(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_add_months(Months::new(months))
        .and_then(|t| t.checked_add_signed(Duration::hours(1)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Classify a cookie expiry. A cookie expiring exactly at the threshold is compliant.
pub fn classify(expires: Option<DateTime<Utc>>, now: DateTime<Utc>, months: u32) -> CookieStatus {
    match expires {
        None => CookieStatus::Session,
        Some(at) if at > expiry_threshold(now, months) => CookieStatus::Flagged,
        Some(_) => CookieStatus::Compliant,
    }
}
