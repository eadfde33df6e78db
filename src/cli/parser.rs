//! Line classification for download tool output.
//!
//! Three independent extractors recognize progress, info and playlist
//! lines. Each one is a pure function; malformed numeric content in an
//! otherwise recognized line yields `None` instead of an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::cli::ProgressEvent;

static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[download\]\s+([\d.]+)").expect("progress pattern is valid"));

static INFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[info\]\s+(\S+)").expect("info pattern is valid"));

static PLAYLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\sDownloading\sitem\s(\d+)\sof\s(\d+)")
        .expect("playlist pattern is valid")
});

/// Parse a `[download]  37.5% of ...` line into a percentage.
#[must_use]
pub fn parse_progress(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_RE.captures(line)?;
    let token = caps.get(1)?.as_str();

    match token.parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=100.0).contains(&value) => {
            Some(ProgressEvent::DownloadPercent { value })
        }
        _ => {
            tracing::trace!(token, "Ignoring malformed progress value");
            None
        }
    }
}

/// Parse an `[info] <id>:` line into the identifier of the current item.
///
/// The last character of the token is always dropped, whatever it is.
#[must_use]
pub fn parse_now_downloading(line: &str) -> Option<ProgressEvent> {
    let caps = INFO_RE.captures(line)?;
    let token = caps.get(1)?.as_str();

    let mut chars = token.chars();
    chars.next_back();
    let identifier = chars.as_str();

    if identifier.is_empty() {
        return None;
    }

    Some(ProgressEvent::NowDownloading {
        identifier: identifier.to_string(),
    })
}

/// Parse a `[download] Downloading item <n> of <m>` line.
///
/// Both numbers are relayed as the tool printed them; only values that do
/// not fit a `u32` are rejected.
#[must_use]
pub fn parse_playlist_position(line: &str) -> Option<ProgressEvent> {
    let caps = PLAYLIST_RE.captures(line)?;
    let current = caps.get(1)?.as_str().parse::<u32>().ok();
    let total = caps.get(2)?.as_str().parse::<u32>().ok();

    match (current, total) {
        (Some(current), Some(total)) => Some(ProgressEvent::PlaylistPosition { current, total }),
        _ => {
            tracing::trace!(line, "Ignoring malformed playlist position");
            None
        }
    }
}

/// Classify a line into at most one structured event.
///
/// Extractors are tried in order: progress, info, playlist.
#[must_use]
pub fn classify(line: &str) -> Option<ProgressEvent> {
    parse_progress(line)
        .or_else(|| parse_now_downloading(line))
        .or_else(|| parse_playlist_position(line))
}

/// Run every extractor against a line and collect all matches in order.
#[must_use]
pub fn classify_all(line: &str) -> Vec<ProgressEvent> {
    [
        parse_progress(line),
        parse_now_downloading(line),
        parse_playlist_position(line),
    ]
    .into_iter()
    .flatten()
    .collect()
}
