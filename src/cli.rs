use clap::Parser;
use ytsum::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Transcribe and summarize each YouTube video a page navigates to",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Page locations, video URLs or video IDs, one per navigation (reads from stdin if omitted)
    pub locations: Vec<String>,

    /// Summarize each transcript via LLM
    #[arg(short, long)]
    pub summarize: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Preferred caption language, matched against track names (e.g. "English")
    #[arg(short, long)]
    pub lang: Option<String>,

    /// LLM model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// How long to wait for the target region, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Show configuration and session details
    #[arg(short, long)]
    pub verbose: bool,
}
