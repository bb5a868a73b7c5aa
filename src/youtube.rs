use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::fetch::PageFetcher;
use crate::{CaptionTrack, Error, format, transcript, watch_url};

/// Language tried first when picking a caption track
pub const DEFAULT_LANGUAGE: &str = "English";

/// Precedes the caption catalogue in the watch page's embedded player response
const CAPTIONS_MARKER: &str = "\"captions\":";

/// Follows the caption catalogue
const CAPTIONS_END_MARKER: &str = ",\"videoDetails";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").expect("title pattern is a valid regex"));
const TITLE_SUFFIX: &str = " - YouTube";

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct RawCaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    name: Option<TrackName>,
    #[serde(rename = "languageCode")]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl RawCaptionTrack {
    fn language(&self) -> String {
        let name = self.name.as_ref();
        name.and_then(|n| n.simple_text.clone())
            .or_else(|| {
                name.and_then(|n| n.runs.as_ref())
                    .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
            })
            .filter(|language| !language.is_empty())
            .or_else(|| self.language_code.clone())
            .unwrap_or_default()
    }
}

impl From<RawCaptionTrack> for CaptionTrack {
    fn from(raw: RawCaptionTrack) -> Self {
        CaptionTrack {
            language: raw.language(),
            source_url: raw.base_url,
        }
    }
}

/// Fetch the watch page and list the caption tracks it advertises
pub async fn fetch_caption_tracks(fetcher: &dyn PageFetcher, video_id: &str) -> Result<Vec<CaptionTrack>, Error> {
    let page_html = fetcher.fetch_text(&watch_url(video_id)).await?;
    let tracks = extract_caption_tracks(&page_html).map_err(|e| match e {
        Error::NoCaptionsAvailable(reason) => Error::NoCaptionsAvailable(format!("video {video_id}: {reason}")),
        other => other,
    })?;
    debug!("Video {video_id} has {} caption tracks", tracks.len());
    Ok(tracks)
}

/// Pull the caption catalogue out of a watch page.
///
/// The catalogue is located by plain substring markers, which breaks whenever
/// the page layout changes; that surfaces as `NoCaptionsAvailable` or `Parse`.
pub fn extract_caption_tracks(page_html: &str) -> Result<Vec<CaptionTrack>, Error> {
    let Some((_, after_marker)) = page_html.split_once(CAPTIONS_MARKER) else {
        return Err(Error::NoCaptionsAvailable("caption marker not found".to_string()));
    };
    let segment = after_marker
        .split_once(CAPTIONS_MARKER)
        .map_or(after_marker, |(head, _)| head);
    let segment = segment
        .split_once(CAPTIONS_END_MARKER)
        .map_or(segment, |(head, _)| head);
    let json = segment.replace('\n', "");

    let captions: CaptionsData =
        serde_json::from_str(&json).map_err(|e| Error::Parse(format!("caption catalogue: {e}")))?;

    let tracks: Vec<CaptionTrack> = captions
        .player_captions_tracklist_renderer
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(CaptionTrack::from)
        .collect();

    if tracks.is_empty() {
        return Err(Error::NoCaptionsAvailable("caption catalogue is empty".to_string()));
    }
    Ok(tracks)
}

/// Stable sort: exact language matches, then variants containing the language, then the rest.
pub fn sort_by_language(tracks: &mut [CaptionTrack], desired: &str) {
    tracks.sort_by_key(|track| {
        if track.language == desired {
            0
        } else if track.language.contains(desired) {
            1
        } else {
            2
        }
    });
}

/// The track to transcribe: the first one after sorting by language preference
pub fn preferred_track(mut tracks: Vec<CaptionTrack>, desired: &str) -> Result<CaptionTrack, Error> {
    sort_by_language(&mut tracks, desired);
    tracks
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoCaptionsAvailable("no caption tracks to choose from".to_string()))
}

/// Resolve, fetch and format the transcript of a video
pub async fn fetch_transcript(fetcher: &dyn PageFetcher, video_id: &str, lang: &str) -> Result<String, Error> {
    let tracks = fetch_caption_tracks(fetcher, video_id).await?;
    let track = preferred_track(tracks, lang)?;
    debug!("Using caption track: lang={}", track.language);

    let fragments = transcript::fetch_fragments(fetcher, &track.source_url).await?;
    Ok(format::format_transcript(&fragments))
}

/// Fetch the watch page and read the video title from it
pub async fn fetch_title(fetcher: &dyn PageFetcher, video_id: &str) -> Result<String, Error> {
    let page_html = fetcher.fetch_text(&watch_url(video_id)).await?;
    extract_title(&page_html).ok_or_else(|| Error::TitleNotFound {
        video_id: video_id.to_string(),
    })
}

/// Contents of the page's `<title>` with the site suffix removed
pub fn extract_title(page_html: &str) -> Option<String> {
    TITLE_RE.captures(page_html).map(|caps| {
        let title = caps[1].replacen(TITLE_SUFFIX, "", 1);
        html_escape::decode_html_entities(&title).trim().to_string()
    })
}
