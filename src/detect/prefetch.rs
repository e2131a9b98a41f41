//! DNS prefetching hints

use serde::Serialize;

use super::is_match;

/// A `dns-prefetch` hint with a human explanation when the host is known
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrefetchHint {
    /// Target as written, without a leading `//`
    pub target: String,
    /// Known service behind the host
    pub explanation: Option<&'static str>,
}

/// Explain every hint, keeping document order
pub fn explain_all(hints: &[String]) -> Vec<PrefetchHint> {
    hints.iter().map(|h| explain(h)).collect()
}

/// Explain a single hint
pub fn explain(hint: &str) -> PrefetchHint {
    let target = hint.strip_prefix("//").unwrap_or(hint).to_string();

    let explanation = if target.contains("fonts.googleapis.com") {
        Some("Google Fonts")
    } else if target.contains("gravatar.com") {
        Some("Automattic Gravatar Service")
    } else if target.contains("s.w.org") {
        Some("WordPress Emojis CDN")
    } else if is_match(pattern!(r"s[0-9]\.wp\.com"), &target) {
        Some("WordPress Styles CDN")
    } else if is_match(pattern!(r"i[0-9]\.wp\.com"), &target) {
        Some("WordPress Images CDN")
    } else if is_match(pattern!(r"v[0-9]\.wordpress\.com"), &target) {
        Some("WordPress Videos CDN")
    } else if target.contains("maxcdn.bootstrapcdn.com") {
        Some("Bootstrap CDN")
    } else if target.contains("checkout.stripe.com") {
        Some("Stripe Online Payments")
    } else if target.contains("code.jquery.com") {
        Some("jQuery CDN")
    } else if target.contains("translate.google.com") {
        Some("Google Translate")
    } else if target.contains("use.typekit.net") {
        Some("Adobe Typekit Web Fonts")
    } else if target.contains("use.fontawesome.com") {
        Some("Font Awesome CDN")
    } else {
        None
    };

    PrefetchHint {
        target,
        explanation,
    }
}
