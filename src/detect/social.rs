//! Social media widgets and SDKs

use serde::Serialize;

use crate::types::ResourceSet;

/// Social widgets found in the page scripts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SocialReport {
    /// Facebook JavaScript SDK (`connect.facebook.net`)
    pub fb_connect: bool,
    /// Facebook Graph API calls
    pub fb_graph: bool,
    /// Pinterest widgets
    pub pinterest: bool,
    /// Twitter / X widgets
    pub twitter: bool,
}

impl SocialReport {
    /// `(network, widget, key)` for each widget found, in a fixed order.
    ///
    /// `key` is the name the widget is reported under in recommendations.
    pub fn widgets(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        [
            (self.fb_connect, ("Facebook", "Connect", "fb_connect")),
            (self.fb_graph, ("Facebook", "Graph", "fb_graph")),
            (self.pinterest, ("Pinterest", "", "pinterest")),
            (self.twitter, ("Twitter", "Widgets", "twitter")),
        ]
        .into_iter()
        .filter_map(|(found, widget)| found.then_some(widget))
        .collect()
    }
}

/// Scan script URLs and bodies (external and inline) for social widgets
pub fn detect(js: &ResourceSet) -> SocialReport {
    let mentions = |needles: &[&str]| {
        js.urls()
            .map(|u| u.as_str())
            .chain(js.texts())
            .any(|text| needles.iter().any(|n| text.contains(n)))
    };

    SocialReport {
        fb_connect: mentions(&["connect.facebook.net"]),
        fb_graph: mentions(&["graph.facebook.com"]),
        pinterest: mentions(&["assets.pinterest.com", "pinit.js"]),
        twitter: mentions(&["platform.twitter.com/widgets.js"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FetchResult;
    use url::Url;

    #[test]
    fn test_detects_widgets_in_urls_and_inline_code() {
        let js = ResourceSet {
            resources: vec![FetchResult {
                url: Url::parse("https://assets.pinterest.com/js/pinit.js").unwrap(),
                content: Some("/* pinterest */".into()),
                headers: None,
                status_code: 200,
                status_message: "OK".into(),
            }],
            inline: vec![
                "js.src = 'https://connect.facebook.net/en_US/sdk.js';".into(),
            ],
        };
        let report = detect(&js);
        assert!(report.fb_connect);
        assert!(report.pinterest);
        assert!(!report.fb_graph);
        assert_eq!(
            report.widgets(),
            vec![
                ("Facebook", "Connect", "fb_connect"),
                ("Pinterest", "", "pinterest")
            ]
        );
    }

    #[test]
    fn test_nothing_found() {
        assert!(detect(&ResourceSet::default()).widgets().is_empty());
    }
}
