use async_trait::async_trait;
use eyre::Result;
use serde::Serialize;

use crate::summarize::SummaryClient;
use crate::watcher::{ElementProbe, Presenter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything shown for one video
#[derive(Debug, Clone, Serialize)]
pub struct Presentation {
    pub video_id: String,
    pub title: String,
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Render as a heading followed by the transcript and the optional summary
pub fn render_text(presentation: &Presentation) -> String {
    let mut out = format!(
        "{} ({})\n\n{}",
        presentation.title, presentation.video_id, presentation.transcript
    );
    if let Some(ref summary) = presentation.summary {
        out.push_str("\n\n--- Summary ---\n");
        out.push_str(summary);
    }
    out
}

pub fn render_json(presentation: &Presentation) -> Result<String> {
    Ok(serde_json::to_string_pretty(presentation)?)
}

/// Prints each presented video to stdout, summarizing it first when a client is configured
pub struct StdoutPresenter {
    format: OutputFormat,
    summarizer: Option<SummaryClient>,
}

impl StdoutPresenter {
    pub fn new(format: OutputFormat, summarizer: Option<SummaryClient>) -> Self {
        Self { format, summarizer }
    }
}

#[async_trait]
impl Presenter for StdoutPresenter {
    async fn present(&self, title: &str, transcript: &str, video_id: &str) -> Result<()> {
        let summary = match self.summarizer {
            Some(ref client) => Some(client.summarize(title, transcript).await?),
            None => None,
        };

        let presentation = Presentation {
            video_id: video_id.to_string(),
            title: title.to_string(),
            transcript: transcript.to_string(),
            summary,
        };

        let rendered = match self.format {
            OutputFormat::Text => render_text(&presentation),
            OutputFormat::Json => render_json(&presentation)?,
        };
        println!("{rendered}");
        Ok(())
    }
}

/// The terminal is the only region there is, and it is always there
pub struct StdoutRegion;

#[async_trait]
impl ElementProbe for StdoutRegion {
    fn is_present(&self, _region: &str) -> bool {
        true
    }

    async fn appeared(&self, _region: &str) {}
}
