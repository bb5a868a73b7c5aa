//! Plain-text rendering of a transcript.
//!
//! The output of [`format_transcript`] is pasted verbatim into the summary
//! prompt, so the line layout is a stable contract.

use crate::{Error, TranscriptFragment};

const START_PREFIX: &str = "Start: ";
const DURATION_SEPARATOR: &str = ", Duration: ";
const TEXT_SEPARATOR: &str = ", Text: ";

/// Render a seconds value as `M:SS`, flooring the seconds.
///
/// Unparseable, negative or non-finite values render as `0:00`.
pub fn seconds_to_minutes(seconds: &str) -> String {
    let total = seconds
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(0.0);
    let whole = total.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// One line of the transcript
pub fn format_fragment(fragment: &TranscriptFragment) -> String {
    format!(
        "{START_PREFIX}{}{DURATION_SEPARATOR}{}{TEXT_SEPARATOR}{}",
        seconds_to_minutes(&fragment.start_seconds),
        seconds_to_minutes(&fragment.duration_seconds),
        fragment.text
    )
}

/// Render fragments one per line, in order
pub fn format_transcript(fragments: &[TranscriptFragment]) -> String {
    fragments.iter().map(format_fragment).collect::<Vec<_>>().join("\n")
}

/// Reconstruct canonical fragments from formatted text.
///
/// Timings come back as whole seconds, so `format_transcript(&parse_formatted(s)?)`
/// reproduces `s` for any `s` produced by [`format_transcript`].
pub fn parse_formatted(formatted: &str) -> Result<Vec<TranscriptFragment>, Error> {
    if formatted.is_empty() {
        return Ok(Vec::new());
    }
    formatted.split('\n').map(parse_line).collect()
}

fn parse_line(line: &str) -> Result<TranscriptFragment, Error> {
    let malformed = || Error::Parse(format!("malformed transcript line: {line:?}"));

    let rest = line.strip_prefix(START_PREFIX).ok_or_else(malformed)?;
    let (start, rest) = rest.split_once(DURATION_SEPARATOR).ok_or_else(malformed)?;
    let (duration, text) = rest.split_once(TEXT_SEPARATOR).ok_or_else(malformed)?;

    Ok(TranscriptFragment::new(
        minutes_to_seconds(start).ok_or_else(malformed)?.to_string(),
        minutes_to_seconds(duration).ok_or_else(malformed)?.to_string(),
        text,
    ))
}

fn minutes_to_seconds(display: &str) -> Option<u64> {
    let (minutes, seconds) = display.split_once(':')?;
    let seconds: u64 = seconds.parse().ok().filter(|s| *s < 60)?;
    Some(minutes.parse::<u64>().ok()? * 60 + seconds)
}
