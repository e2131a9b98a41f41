//! General page information

use serde::Serialize;
use url::Url;

use super::captures;
use crate::parser::ParsedPage;
use crate::types::ResourceSet;

/// Title, description and software of the audited page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneralInfo {
    /// Document title
    pub title: String,
    /// Meta description (empty if absent)
    pub description: String,
    /// Canonical page URL
    pub url: Url,
    /// Declared generators (CMS, site builders)
    pub generators: Vec<String>,
    /// WordPress theme, when the site runs WordPress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// WordPress plugins loading assets on the page
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
}

impl GeneralInfo {
    /// Whether the page is served by WordPress
    pub fn is_wordpress(&self) -> bool {
        self.generators
            .iter()
            .any(|g| g.to_ascii_lowercase().contains("wordpress"))
            || self.theme.is_some()
            || !self.plugins.is_empty()
    }
}

/// Summarize the page. Theme and plugins come from `wp-content` asset paths.
pub fn detect(page: &ParsedPage, url: &Url, css: &ResourceSet, js: &ResourceSet) -> GeneralInfo {
    let theme_path = pattern!(r"/wp-content/themes/([^/]+)/");
    let plugin_path = pattern!(r"/wp-content/plugins/([^/]+)/");

    let theme = css
        .urls()
        .chain(&page.stylesheet_urls)
        .find_map(|u| captures(theme_path, u.path()))
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()));

    let mut plugins: Vec<String> = Vec::new();
    for u in css
        .urls()
        .chain(js.urls())
        .chain(&page.stylesheet_urls)
        .chain(&page.script_urls)
    {
        if let Some(name) = captures(plugin_path, u.path()).and_then(|c| c.get(1)) {
            if !plugins.iter().any(|p| p == name.as_str()) {
                plugins.push(name.as_str().to_string());
            }
        }
    }

    GeneralInfo {
        title: page.title.clone(),
        description: page.description.clone(),
        url: url.clone(),
        generators: page.generators.clone(),
        theme,
        plugins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wordpress_theme_and_plugins() {
        let url = Url::parse("https://blog.example.com/").unwrap();
        let page = ParsedPage::parse(
            r#"<html><head><title>Blog</title>
<meta name="generator" content="WordPress 6.4.2">
<link rel="stylesheet" href="/wp-content/themes/twentytwenty/style.css">
<link rel="stylesheet" href="/wp-content/plugins/contact-form-7/includes/css/styles.css">
<script src="/wp-content/plugins/jetpack/modules/a.js"></script>
<script src="/wp-content/plugins/contact-form-7/includes/js/index.js"></script>
</head></html>"#,
            &url,
        );
        let info = detect(&page, &url, &ResourceSet::default(), &ResourceSet::default());
        assert_eq!(info.title, "Blog");
        assert_eq!(info.theme.as_deref(), Some("twentytwenty"));
        assert_eq!(info.plugins, vec!["contact-form-7", "jetpack"]);
        assert!(info.is_wordpress());
    }

    #[test]
    fn test_plain_site() {
        let url = Url::parse("http://example.com/").unwrap();
        let page = ParsedPage::parse("<title>Hi</title>", &url);
        let info = detect(&page, &url, &ResourceSet::default(), &ResourceSet::default());
        assert!(!info.is_wordpress());
        assert!(info.generators.is_empty());
        assert_eq!(info.url, url);
    }
}
