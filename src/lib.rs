pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod output;
pub mod summarize;
pub mod transcript;
pub mod watcher;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

use regex::Regex;

pub use error::Error;

/// Host that serves watch pages
pub const WATCH_HOST: &str = "www.youtube.com";

/// One selectable caption stream for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language: String,
    pub source_url: String,
}

/// A single timed span of caption text.
///
/// Timings are kept as the strings found in the caption document; the
/// formatter owns their interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub start_seconds: String,
    pub duration_seconds: String,
    pub text: String,
}

impl TranscriptFragment {
    pub fn new(start_seconds: impl Into<String>, duration_seconds: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            start_seconds: start_seconds.into(),
            duration_seconds: duration_seconds.into(),
            text: text.into(),
        }
    }
}

/// Watch page URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://{WATCH_HOST}/watch?v={video_id}")
}

/// Video id of a page location, if the location is a watch page.
///
/// Only `www.youtube.com` pages carrying a non-empty `v` query parameter qualify.
pub fn video_id_from_location(location: &str) -> Option<String> {
    let url = url::Url::parse(location.trim()).ok()?;
    if url.host_str() != Some(WATCH_HOST) {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

const VIDEO_ID_PATTERNS: [&str; 5] = [
    // Bare 11-character video ID
    r"^([a-zA-Z0-9_-]{11})$",
    r"(?:youtube\.com/watch\?.*v=)([a-zA-Z0-9_-]{11})",
    r"youtu\.be/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
    r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
];

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    VIDEO_ID_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .find_map(|re| re.captures(input).map(|caps| caps[1].to_string()))
}
