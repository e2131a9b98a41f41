//! Content delivery networks

use serde::Serialize;

use crate::types::ResourceSet;

/// Known CDN hosts and what they serve
pub const KNOWN_CDNS: &[(&str, &str)] = &[
    ("ajax.googleapis.com", "Google Hosted Libraries"),
    ("fonts.googleapis.com", "Google Fonts API"),
    ("cdnjs.cloudflare.com", "cdnjs by Cloudflare"),
    ("cdn.jsdelivr.net", "jsDelivr open source CDN"),
    ("unpkg.com", "unpkg npm CDN"),
    ("code.jquery.com", "jQuery CDN"),
    ("maxcdn.bootstrapcdn.com", "BootstrapCDN by MaxCDN"),
    ("stackpath.bootstrapcdn.com", "BootstrapCDN by StackPath"),
    ("ajax.aspnetcdn.com", "Microsoft Ajax CDN"),
    ("use.fontawesome.com", "Font Awesome CDN"),
    ("use.typekit.net", "Adobe Typekit"),
    ("wp.com", "WordPress.com CDN (Automattic)"),
    ("cloudfront.net", "Amazon CloudFront"),
    ("akamaihd.net", "Akamai"),
    ("azureedge.net", "Azure CDN"),
    ("fastly.net", "Fastly"),
    ("b-cdn.net", "BunnyCDN"),
    ("kxcdn.com", "KeyCDN"),
];

/// A CDN used by the page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cdn {
    /// Host pattern from [`KNOWN_CDNS`]
    pub host: &'static str,
    /// What the CDN is
    pub description: &'static str,
}

/// CDNs serving any stylesheet or script, in table order, without duplicates
pub fn detect(css: &ResourceSet, js: &ResourceSet) -> Vec<Cdn> {
    KNOWN_CDNS
        .iter()
        .filter(|(host, _)| {
            css.urls()
                .chain(js.urls())
                .any(|url| url.as_str().contains(*host))
        })
        .map(|&(host, description)| Cdn { host, description })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FetchResult;
    use url::Url;

    fn set(urls: &[&str]) -> ResourceSet {
        ResourceSet {
            resources: urls
                .iter()
                .map(|u| FetchResult::transport_failure(Url::parse(u).unwrap(), "offline"))
                .collect(),
            inline: Vec::new(),
        }
    }

    #[test]
    fn test_detects_cdns_once_in_table_order() {
        let css = set(&["https://maxcdn.bootstrapcdn.com/bootstrap/4.0.0/css/bootstrap.min.css"]);
        let js = set(&[
            "https://code.jquery.com/jquery-3.7.1.min.js",
            "https://code.jquery.com/ui/1.13.2/jquery-ui.min.js",
            "https://shop.example.com/app.js",
        ]);
        let found: Vec<_> = detect(&css, &js).into_iter().map(|c| c.host).collect();
        assert_eq!(found, vec!["code.jquery.com", "maxcdn.bootstrapcdn.com"]);
    }

    #[test]
    fn test_no_cdn() {
        assert!(detect(&set(&["https://example.com/a.css"]), &ResourceSet::default()).is_empty());
    }
}
