use std::time::Duration;

/// Failures of the extraction pipeline.
///
/// Every variant aborts the attempt for one video only; the watcher logs it
/// and keeps listening.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no captions available: {0}")]
    NoCaptionsAvailable(String),

    #[error("unexpected document shape: {0}")]
    Parse(String),

    #[error("title not found for video {video_id}")]
    TitleNotFound { video_id: String },

    #[error("element #{region} did not appear within {timeout:?}")]
    ElementWaitTimeout { region: String, timeout: Duration },
}

impl Error {
    pub(crate) fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Error::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
