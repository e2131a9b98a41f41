//! Web fonts and where they are served from
//!
//! Fonts are found in three places:
//! - Google Fonts API stylesheets (`fonts.googleapis.com/css?family=...`)
//! - `@font-face` rules in external and inline CSS
//! - Typekit kits and the WebFont loader in scripts

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use super::{capture_or_empty, captures};
use crate::types::ResourceSet;

/// Who serves a font
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontProvider {
    /// fonts.googleapis.com / fonts.gstatic.com
    Google,
    /// Adobe Typekit
    Typekit,
    /// wordpress.com / wp.com
    Wordpress,
    /// wixstatic.com
    Wix,
    /// Any other third-party host
    Other,
    /// The audited site itself
    Local,
}

impl FontProvider {
    /// Human description used as section sub-heading
    pub fn description(self) -> &'static str {
        match self {
            FontProvider::Google => "Google Fonts",
            FontProvider::Typekit => "Adobe Typekit Fonts",
            FontProvider::Wordpress => "Fonts from wordpress.com",
            FontProvider::Wix => "Fonts from wixstatic.com",
            FontProvider::Other => "Fonts from other third-party hosts",
            FontProvider::Local => "Fonts directly from the site",
        }
    }

    /// Whether loading the font contacts a host other than the audited site
    pub fn is_third_party(self) -> bool {
        self != FontProvider::Local
    }

    fn for_url(url: &Url, page: &Url) -> Self {
        if url.scheme() == "data" {
            return FontProvider::Local;
        }
        let host = url.host_str().unwrap_or_default();
        if host == page.host_str().unwrap_or_default() {
            FontProvider::Local
        } else if host.ends_with("googleapis.com") || host.ends_with("gstatic.com") {
            FontProvider::Google
        } else if host.ends_with("typekit.net") {
            FontProvider::Typekit
        } else if host.ends_with("wp.com") || host.ends_with("wordpress.com") {
            FontProvider::Wordpress
        } else if host.ends_with("wixstatic.com") {
            FontProvider::Wix
        } else {
            FontProvider::Other
        }
    }
}

impl fmt::Display for FontProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A font family and the styles it is loaded in
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FontFamily {
    /// Family name
    pub name: String,
    /// Weights / styles, as declared
    pub styles: Vec<String>,
}

/// Fonts served by one provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FontGroup {
    /// Who serves these fonts
    pub provider: FontProvider,
    /// Families in first-seen order
    pub families: Vec<FontFamily>,
    /// Font files or stylesheets fetched from the provider
    pub resources: Vec<Url>,
}

impl FontGroup {
    fn new(provider: FontProvider) -> Self {
        Self {
            provider,
            families: Vec::new(),
            resources: Vec::new(),
        }
    }

    fn add_family(&mut self, name: &str, styles: impl IntoIterator<Item = String>) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let idx = match self.families.iter().position(|f| f.name == name) {
            Some(idx) => idx,
            None => {
                self.families.push(FontFamily {
                    name: name.to_string(),
                    styles: Vec::new(),
                });
                self.families.len() - 1
            }
        };
        let family = &mut self.families[idx];
        for style in styles {
            if !style.is_empty() && !family.styles.contains(&style) {
                family.styles.push(style);
            }
        }
    }

    fn add_resource(&mut self, url: &Url) {
        if !self.resources.contains(url) {
            self.resources.push(url.clone());
        }
    }
}

/// Fonts found on the page, grouped by provider
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FontsReport {
    /// Non-empty groups, in [`FontProvider`] order
    pub groups: Vec<FontGroup>,
}

impl FontsReport {
    /// Whether no font was found
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether any font comes from a third party
    pub fn has_third_party(&self) -> bool {
        self.groups.iter().any(|g| g.provider.is_third_party())
    }

    /// Third-party font resources worth probing for cookies
    pub fn probe_urls(&self) -> Vec<Url> {
        self.groups
            .iter()
            .filter(|g| g.provider.is_third_party())
            .flat_map(|g| g.resources.iter().cloned())
            .collect()
    }
}

#[derive(Default)]
struct Collector {
    groups: BTreeMap<FontProvider, FontGroup>,
}

impl Collector {
    fn group(&mut self, provider: FontProvider) -> &mut FontGroup {
        self.groups
            .entry(provider)
            .or_insert_with(|| FontGroup::new(provider))
    }

    fn finish(self) -> FontsReport {
        FontsReport {
            groups: self
                .groups
                .into_values()
                .filter(|g| !g.families.is_empty() || !g.resources.is_empty())
                .collect(),
        }
    }
}

/// Collect fonts from stylesheets and scripts of the page at `page`
pub fn detect(css: &ResourceSet, js: &ResourceSet, page: &Url) -> FontsReport {
    let mut fonts = Collector::default();

    for sheet in &css.resources {
        match sheet.host() {
            "fonts.googleapis.com" => {
                let group = fonts.group(FontProvider::Google);
                group.add_resource(&sheet.url);
                for (name, styles) in google_families(&sheet.url) {
                    group.add_family(&name, styles);
                }
            }
            host => {
                if host.ends_with("typekit.net") {
                    fonts.group(FontProvider::Typekit).add_resource(&sheet.url);
                }
                font_faces(&mut fonts, sheet.text(), &sheet.url, page);
            }
        }
    }
    for inline in &css.inline {
        font_faces(&mut fonts, inline, page, page);
    }

    for script in &js.resources {
        if script.host().ends_with("typekit.net") {
            fonts.group(FontProvider::Typekit).add_resource(&script.url);
        }
    }
    let loader = pattern!(r#"(?s)WebFont\.load\(\s*\{\s*google\s*:\s*\{\s*families\s*:\s*\[([^\]]*)\]"#);
    let quoted = pattern!(r#"['"]([^'"]+)['"]"#);
    for text in js.texts() {
        let (Some(list), Some(quoted)) = (captures(loader, text).and_then(|c| c.get(1)), quoted) else {
            continue;
        };
        for entry in quoted.captures_iter(list.as_str()).filter_map(|c| c.get(1)) {
            let (name, styles) = entry.as_str().split_once(':').unwrap_or((entry.as_str(), ""));
            fonts
                .group(FontProvider::Google)
                .add_family(name, split_styles(styles));
        }
    }

    fonts.finish()
}

/// Families requested from the Google Fonts API, with their styles
fn google_families(url: &Url) -> Vec<(String, Vec<String>)> {
    url.query_pairs()
        .filter(|(key, _)| key == "family")
        .flat_map(|(_, value)| {
            value
                .split('|')
                .map(|spec| {
                    let (name, styles) = spec.split_once(':').unwrap_or((spec, ""));
                    (name.trim().to_string(), split_styles(styles))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn split_styles(styles: &str) -> Vec<String> {
    // css2 API: "wght@400;700", css API: "400,700italic"
    let (list, separator) = match styles.split_once('@') {
        Some((_, list)) => (list, ';'),
        None => (styles, ','),
    };
    list.split(separator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn font_faces(fonts: &mut Collector, css: &str, base: &Url, page: &Url) {
    let Some(block) = pattern!(r"(?s)@font-face\s*\{([^}]*)\}") else {
        return;
    };
    let family = pattern!(r#"font-family\s*:\s*['"]?([^;'"]+)"#);
    let weight = pattern!(r"font-weight\s*:\s*([^;]+)");
    let style = pattern!(r"font-style\s*:\s*([^;]+)");
    let src = pattern!(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#);

    for rule in block.captures_iter(css) {
        let Some(body) = rule.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let label = [capture_or_empty(weight, body, 1), capture_or_empty(style, body, 1)]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let label = if label.is_empty() {
            "normal".to_string()
        } else {
            label
        };

        let file = captures(src, body)
            .and_then(|c| c.get(1))
            .and_then(|m| base.join(m.as_str().trim()).ok());
        let provider = file
            .as_ref()
            .map(|url| FontProvider::for_url(url, page))
            .unwrap_or(FontProvider::Local);

        let group = fonts.group(provider);
        group.add_family(&capture_or_empty(family, body, 1), [label]);
        if let Some(url) = file.filter(|u| u.scheme() != "data") {
            group.add_resource(&url);
        }
    }
}
