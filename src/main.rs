use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use eyre::Result;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

mod cli;

use cli::Cli;
use ytsum::config::Config;
use ytsum::fetch::{DEFAULT_FETCH_ATTEMPTS, HttpFetcher};
use ytsum::output::{OutputFormat, StdoutPresenter, StdoutRegion};
use ytsum::summarize::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, SummaryClient};
use ytsum::watcher::{DEFAULT_TARGET_REGION, DEFAULT_WAIT_TIMEOUT, NavigationWatcher, WatchSettings};
use ytsum::youtube::DEFAULT_LANGUAGE;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    let key_line = if std::env::var_os("OPENAI_API_KEY").is_some() {
        "  \x1b[32m✅\x1b[0m OPENAI_API_KEY".to_string()
    } else {
        "  \x1b[31m❌\x1b[0m OPENAI_API_KEY  (not set, needed for --summarize)".to_string()
    };

    let log_path = log_dir().join("ytsum.log");

    format!(
        "\nENVIRONMENT:\n{key_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        ytsum::config::config_path().display(),
        log_path.display()
    )
}

/// Turn user input into a page location; bare IDs and short links become watch URLs
fn to_location(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if ytsum::video_id_from_location(input).is_some() {
        return Some(input.to_string());
    }
    match ytsum::extract_video_id(input) {
        Some(video_id) => Some(ytsum::watch_url(&video_id)),
        None => Some(input.to_string()),
    }
}

/// Feed page changes from the arguments, or from stdin lines when there are none
async fn feed_locations(args: Vec<String>, tx: mpsc::UnboundedSender<String>) -> Result<()> {
    if !args.is_empty() {
        for location in args.iter().filter_map(|arg| to_location(arg)) {
            tx.send(location)?;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(location) = to_location(&line) {
            tx.send(location)?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {e}");
        Config::default()
    });

    // CLI flags take priority over config, config over built-in defaults
    let lang = cli
        .lang
        .clone()
        .or(config.default_lang.clone())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let model = cli
        .model
        .clone()
        .or(config.default_model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or(OutputFormat::Text);
    let wait_timeout = cli
        .timeout_ms
        .or(config.wait_timeout_ms)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_WAIT_TIMEOUT);
    let settings = WatchSettings {
        language: lang,
        target_region: config
            .target_region
            .clone()
            .unwrap_or_else(|| DEFAULT_TARGET_REGION.to_string()),
        wait_timeout,
    };

    if cli.verbose {
        let config_path = ytsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!(
            "Language: {}\nFormat: {format:?}\nRegion wait: {:?}",
            settings.language, settings.wait_timeout
        );
        if cli.summarize {
            eprintln!("Model: {model}");
        }
    }
    debug!("Watch settings: {settings:?}");

    let client = reqwest::Client::new();
    let fetcher = HttpFetcher::new(client.clone()).with_attempts(config.fetch_attempts.unwrap_or(DEFAULT_FETCH_ATTEMPTS));
    let summarizer = cli.summarize.then(|| {
        SummaryClient::new(client.clone(), model, config.temperature.unwrap_or(DEFAULT_TEMPERATURE))
    });
    let presenter = StdoutPresenter::new(format, summarizer);

    let watcher = NavigationWatcher::new(Arc::new(fetcher), Arc::new(StdoutRegion), Arc::new(presenter), settings);

    let (tx, rx) = mpsc::unbounded_channel();
    let feeder = tokio::spawn(feed_locations(cli.locations.clone(), tx));

    let session = watcher.run(rx).await;
    feeder.await??;

    if cli.verbose {
        eprintln!(
            "Last video: {}",
            session.current_video_id().unwrap_or("(none)")
        );
    }

    Ok(())
}
