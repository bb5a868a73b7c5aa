use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::Error;
use crate::fetch::PageFetcher;

/// In-memory `PageFetcher`; unknown URLs answer 404
#[derive(Default)]
pub(crate) struct FakeFetcher {
    responses: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub(crate) fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    pub(crate) fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, Error> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| Error::fetch(url, "404 Not Found"))
    }
}

/// A watch page embedding `caption_tracks_json` the way the player response does
pub(crate) fn watch_page(title: &str, caption_tracks_json: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>{title} - YouTube</title></head><body><script>var ytInitialPlayerResponse = {{"responseContext":{{}},"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":{caption_tracks_json},"audioTracks":[]}}}},"videoDetails":{{"videoId":"x"}}}};</script></body></html>"#
    )
}
