//! Embedded third-party video players

use serde::Serialize;
use std::fmt;
use url::Url;

use super::captures;

/// Video hosting service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VideoProvider {
    /// vimeo.com
    Vimeo,
    /// youtube.com
    Youtube,
    /// dailymotion.com
    Dailymotion,
}

impl fmt::Display for VideoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VideoProvider::Vimeo => "Vimeo",
            VideoProvider::Youtube => "Youtube",
            VideoProvider::Dailymotion => "Dailymotion",
        })
    }
}

/// One embedded player
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Video {
    /// Hosting service
    pub provider: VideoProvider,
    /// Embedded player URL
    pub url: Url,
    /// Video id on the service
    pub id: String,
}

/// First embedded player of each provider in the main document
pub fn detect(html: &str) -> Vec<Video> {
    let vimeo = pattern!(r#"<video.+<source type="video/vimeo" src="(https?://vimeo\.com/(\d+)[^"]*)"#);
    let youtube = pattern!(r#"<iframe.+src="(https?://www\.youtube\.com/embed/([^"?]+)[^"]*)""#);
    let dailymotion =
        pattern!(r#"<iframe.+src="(https?://www\.dailymotion\.com/embed/video/([^"?]+)[^"]*)".*>"#);

    [
        (VideoProvider::Vimeo, vimeo),
        (VideoProvider::Youtube, youtube),
        (VideoProvider::Dailymotion, dailymotion),
    ]
    .into_iter()
    .filter_map(|(provider, re)| {
        let caps = captures(re, html)?;
        Some(Video {
            provider,
            url: Url::parse(caps.get(1)?.as_str()).ok()?,
            id: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
    })
    .collect()
}
