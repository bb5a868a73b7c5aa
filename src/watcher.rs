//! Navigation-driven orchestration.
//!
//! The host page never reloads between videos, so the watcher reacts to every
//! page-change notification and decides from the location alone whether a new
//! video is showing. A [`VideoSession`] remembers the last video it started so
//! repeated notifications for the same video do nothing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::fetch::PageFetcher;
use crate::{Error, video_id_from_location, youtube};

pub const DEFAULT_TARGET_REGION: &str = "related";
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Delivers the page location each time the page changes
#[async_trait]
pub trait ChangeSource: Send {
    /// `None` once the page is gone
    async fn next_change(&mut self) -> Option<String>;
}

#[async_trait]
impl ChangeSource for mpsc::UnboundedReceiver<String> {
    async fn next_change(&mut self) -> Option<String> {
        self.recv().await
    }
}

/// Answers whether a named region of the page exists
#[async_trait]
pub trait ElementProbe: Send + Sync {
    fn is_present(&self, region: &str) -> bool;

    /// Resolves once the region exists
    async fn appeared(&self, region: &str);
}

/// Receives a fully resolved video
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn present(&self, title: &str, transcript: &str, video_id: &str) -> Result<()>;
}

/// Wait at most `timeout` for `region` to exist
pub async fn wait_for_element(probe: &dyn ElementProbe, region: &str, timeout: Duration) -> Result<(), Error> {
    if probe.is_present(region) {
        return Ok(());
    }
    tokio::time::timeout(timeout, probe.appeared(region))
        .await
        .map_err(|_| Error::ElementWaitTimeout {
            region: region.to_string(),
            timeout,
        })
}

/// Most recently started video
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSession {
    current_video_id: Option<String>,
}

impl VideoSession {
    pub fn current_video_id(&self) -> Option<&str> {
        self.current_video_id.as_deref()
    }

    /// Apply a page change. Returns the updated session and, when a new video
    /// is showing, the id to process.
    pub fn observe(self, location: &str) -> (Self, Option<String>) {
        let Some(video_id) = video_id_from_location(location) else {
            debug!("Not a video page, skipping: {location}");
            return (self, None);
        };
        if self.current_video_id() == Some(video_id.as_str()) {
            return (self, None);
        }
        let session = VideoSession {
            current_video_id: Some(video_id.clone()),
        };
        (session, Some(video_id))
    }
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub language: String,
    pub target_region: String,
    pub wait_timeout: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            language: youtube::DEFAULT_LANGUAGE.to_string(),
            target_region: DEFAULT_TARGET_REGION.to_string(),
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    probe: Arc<dyn ElementProbe>,
    presenter: Arc<dyn Presenter>,
    settings: WatchSettings,
}

impl Pipeline {
    async fn process(&self, video_id: String) {
        info!("Processing video {video_id}");
        match self.attempt(&video_id).await {
            Ok(()) => info!("Presented video {video_id}"),
            Err(e) => warn!("Giving up on video {video_id}: {e:#}"),
        }
    }

    async fn attempt(&self, video_id: &str) -> Result<()> {
        let fetcher = self.fetcher.as_ref();
        let (title, transcript) = tokio::try_join!(
            youtube::fetch_title(fetcher, video_id),
            youtube::fetch_transcript(fetcher, video_id, &self.settings.language),
        )?;

        wait_for_element(
            self.probe.as_ref(),
            &self.settings.target_region,
            self.settings.wait_timeout,
        )
        .await?;

        self.presenter.present(&title, &transcript, video_id).await
    }
}

/// Runs the extraction pipeline once per newly shown video
pub struct NavigationWatcher {
    session: VideoSession,
    pipeline: Arc<Pipeline>,
    in_flight: JoinSet<()>,
}

impl NavigationWatcher {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        probe: Arc<dyn ElementProbe>,
        presenter: Arc<dyn Presenter>,
        settings: WatchSettings,
    ) -> Self {
        Self {
            session: VideoSession::default(),
            pipeline: Arc::new(Pipeline {
                fetcher,
                probe,
                presenter,
                settings,
            }),
            in_flight: JoinSet::new(),
        }
    }

    pub fn session(&self) -> &VideoSession {
        &self.session
    }

    /// React to one page change. The session is updated before the attempt
    /// is spawned, so a second notification for the same video is a no-op
    /// even while the first attempt is still running.
    pub fn handle_change(&mut self, location: &str) -> bool {
        let (session, started) = std::mem::take(&mut self.session).observe(location);
        self.session = session;

        let Some(video_id) = started else {
            return false;
        };
        let pipeline = Arc::clone(&self.pipeline);
        self.in_flight.spawn(async move { pipeline.process(video_id).await });
        true
    }

    /// Consume page changes until the source ends, then wait for attempts still in flight
    pub async fn run(mut self, mut changes: impl ChangeSource) -> VideoSession {
        loop {
            tokio::select! {
                change = changes.next_change() => match change {
                    Some(location) => {
                        self.handle_change(&location);
                    }
                    None => break,
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Video attempt aborted: {e}");
                    }
                }
            }
        }

        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                warn!("Video attempt aborted: {e}");
            }
        }
        debug!("Change source closed");
        self.session
    }
}
