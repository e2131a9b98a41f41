//! HTML content extraction
//!
//! The main document is parsed exactly once into a [`ParsedPage`]. The
//! result owns all of its data so it can be carried across await points,
//! unlike the `scraper` DOM it is built from.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

use crate::fetcher::resolve_reference;

macro_rules! selector {
    ($css:literal) => {{
        static SELECTOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse($css).ok());
        SELECTOR.as_ref()
    }};
}

/// Everything the audit needs from the main document
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPage {
    /// Linked stylesheets, resolved against the page URL, in document order
    pub stylesheet_urls: Vec<Url>,
    /// External scripts, resolved against the page URL, in document order
    pub script_urls: Vec<Url>,
    /// Bodies of inline `<script>` elements
    pub inline_js: Vec<String>,
    /// Bodies of `<style>` elements
    pub inline_css: Vec<String>,
    /// `dns-prefetch` hints as written in the document
    pub prefetch: Vec<String>,
    /// Document title
    pub title: String,
    /// `<meta name="description">` content
    pub description: String,
    /// `<meta name="generator">` contents
    pub generators: Vec<String>,
}

impl ParsedPage {
    /// Parse `html`, resolving references against `base`
    pub fn parse(html: &str, base: &Url) -> Self {
        let document = Html::parse_document(html);

        Self {
            stylesheet_urls: attr_values(&document, selector!("link[rel~='stylesheet'][href]"), "href")
                .filter_map(|href| resolve_reference(base, href))
                .collect(),
            script_urls: attr_values(&document, selector!("script[src]"), "src")
                .filter_map(|src| resolve_reference(base, src))
                .collect(),
            inline_js: select(&document, selector!("script:not([src])"))
                .map(text_of)
                .filter(|body| !body.trim().is_empty())
                .collect(),
            inline_css: select(&document, selector!("style"))
                .map(text_of)
                .filter(|body| !body.trim().is_empty())
                .collect(),
            prefetch: attr_values(&document, selector!("link[rel~='dns-prefetch'][href]"), "href")
                .map(|href| href.trim().to_string())
                .filter(|href| !href.is_empty())
                .collect(),
            title: select(&document, selector!("title"))
                .next()
                .map(|el| text_of(el).trim().to_string())
                .unwrap_or_default(),
            description: attr_values(&document, selector!("meta[name='description'][content]"), "content")
                .next()
                .map(|c| c.trim().to_string())
                .unwrap_or_default(),
            generators: attr_values(&document, selector!("meta[name='generator'][content]"), "content")
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }
}

fn select<'a>(
    document: &'a Html,
    selector: Option<&'a Selector>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    selector.into_iter().flat_map(move |s| document.select(s))
}

fn attr_values<'a>(
    document: &'a Html,
    selector: Option<&'a Selector>,
    attr: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    select(document, selector).filter_map(move |el| el.value().attr(attr))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
