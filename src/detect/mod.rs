//! Content detectors
//!
//! Every detector scans its input once and returns a structured result
//! (`Option<T>`, a list, or a record of flags). There is no separate
//! "is it there?" check that could disagree with the extracted details: when
//! a detector recognizes something but cannot extract a field, that field is
//! left empty.
//!
//! Detectors are pure functions over already fetched text. None of them
//! performs I/O.

/// Compile a built-in regular expression on first use.
///
/// Evaluates to `Option<&'static Regex>`; a pattern that fails to compile
/// never matches.
macro_rules! pattern {
    ($re:literal) => {{
        static PATTERN: std::sync::LazyLock<Option<regex::Regex>> =
            std::sync::LazyLock::new(|| regex::Regex::new($re).ok());
        PATTERN.as_ref()
    }};
}

pub mod analytics;
pub mod cdn;
pub mod fonts;
pub mod forms;
pub mod general;
pub mod prefetch;
pub mod social;
pub mod videos;

use regex::{Captures, Regex};

pub(crate) fn is_match(re: Option<&Regex>, text: &str) -> bool {
    re.is_some_and(|re| re.is_match(text))
}

pub(crate) fn captures<'t>(re: Option<&Regex>, text: &'t str) -> Option<Captures<'t>> {
    re.and_then(|re| re.captures(text))
}

/// First capture group `group` of `re` in `text`, or an empty string
pub(crate) fn capture_or_empty(re: Option<&Regex>, text: &str, group: usize) -> String {
    captures(re, text)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
