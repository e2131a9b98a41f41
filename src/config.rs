//! Configuration types for privacy-audit

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::cookies::DEFAULT_THRESHOLD_MONTHS;
use crate::error::{Error, Result};
use crate::fetcher::DEFAULT_USER_AGENT;
use crate::tasks::TaskKind;

/// What to audit and how
///
/// ```
/// use privacy_audit::AuditConfig;
///
/// let config: AuditConfig = serde_json::from_str(
///     r#"{ "url": "example.com", "tasks": ["cookies", "ssl"] }"#,
/// ).unwrap();
/// assert_eq!(config.cookie_threshold_months, 13);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Site to audit, absolute (`https://example.com`), protocol-relative
    /// (`//example.com`) or bare (`example.com`)
    pub url: String,

    /// Task names to run (default: empty = every task)
    #[serde(default)]
    pub tasks: Vec<String>,

    /// Tolerated cookie lifetime in months (default: 13, 0 = default)
    #[serde(default = "default_cookie_threshold_months")]
    pub cookie_threshold_months: u32,

    /// User agent announced to the site (default: a desktop Chrome)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds (None = transport default)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            tasks: Vec::new(),
            cookie_threshold_months: default_cookie_threshold_months(),
            user_agent: default_user_agent(),
            request_timeout: None,
        }
    }
}

impl AuditConfig {
    /// Configuration auditing `url` with every task
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Check the configuration before any request is made
    ///
    /// # Errors
    /// Returns [`Error::Config`] for an unusable URL, an unknown task name or
    /// an empty user agent.
    pub fn validate(&self) -> Result<AuditPlan> {
        let input = self.url.trim();
        if input.is_empty() {
            return Err(Error::config("url", "url must not be empty"));
        }

        let bare = strip_protocol(input);
        let start = Url::parse(&format!("http://{bare}"))
            .ok()
            .filter(|u| u.host_str().is_some_and(|h| !h.is_empty()))
            .ok_or_else(|| Error::config("url", format!("'{input}' is not a usable URL")))?;

        let mut selection = Vec::with_capacity(self.tasks.len());
        for name in &self.tasks {
            let task: TaskKind = name.parse()?;
            if !selection.contains(&task) {
                selection.push(task);
            }
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::config("user_agent", "user agent must not be empty"));
        }

        let cookie_threshold_months = match self.cookie_threshold_months {
            0 => DEFAULT_THRESHOLD_MONTHS,
            months => months,
        };

        Ok(AuditPlan {
            input: input.to_string(),
            start,
            selection,
            cookie_threshold_months,
        })
    }
}

/// A validated configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditPlan {
    /// URL as given by the caller
    pub input: String,
    /// First URL requested: `http://` plus the input without its protocol
    pub start: Url,
    /// Requested tasks, deduplicated, in request order
    pub selection: Vec<TaskKind>,
    /// Effective cookie threshold
    pub cookie_threshold_months: u32,
}

static PROTOCOL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(https?:)?//").ok());

/// Drop the first `scheme://` (or bare `//`) and then one leading `/`
pub fn strip_protocol(input: &str) -> String {
    let stripped = match PROTOCOL.as_ref() {
        Some(re) => re.replacen(input, 1, "").into_owned(),
        None => input.to_string(),
    };
    match stripped.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => stripped,
    }
}

fn default_cookie_threshold_months() -> u32 {
    DEFAULT_THRESHOLD_MONTHS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
