//! Colored terminal output for download jobs.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::cli::ProgressEvent;
use crate::supervisor::ProgressTracker;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated output lines.
const DEFAULT_MAX_LEN: usize = 160;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 30;

/// Truncate a string to a maximum number of characters, adding ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Render a fixed-width progress bar for a percentage.
#[must_use]
pub fn progress_bar(percent: f64) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH.saturating_sub(filled))
    )
}

/// Print the command line about to be run.
pub fn print_command(command: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[RUN]".blue().bold(),
        command
    );
    let _ = io::stdout().flush();
}

/// Progress bar, whole percent and playlist position, once a percent is known.
#[must_use]
pub fn progress_line(tracker: &ProgressTracker) -> Option<String> {
    let percent = tracker.percent_rounded()?;
    let bar = progress_bar(f64::from(percent));
    Some(match tracker.playlist() {
        Some((current, total)) => format!("{bar} {percent:>3}% item {current}/{total}"),
        None => format!("{bar} {percent:>3}%"),
    })
}

/// Closing line of a job, for example `Done. (exit code 0)`.
#[must_use]
pub fn completion_summary(tracker: &ProgressTracker) -> String {
    let status = match (tracker.was_cancelled(), tracker.exit_code()) {
        (true, _) => "cancelled".to_string(),
        (false, Some(code)) => format!("exit code {code}"),
        (false, None) => "terminated by signal".to_string(),
    };
    match tracker.errors().len() {
        0 => format!("Done. ({status})"),
        1 => format!("Done. ({status}, 1 error)"),
        n => format!("Done. ({status}, {n} errors)"),
    }
}

/// Print a job event. `tracker` must already include `event`.
///
/// Raw lines are skipped when `quiet` is set.
pub fn print_event(
    event: &ProgressEvent,
    tracker: &ProgressTracker,
    raw_mode: bool,
    quiet: bool,
) {
    match event {
        ProgressEvent::RawLine { text } => {
            if !quiet {
                println!("{}", truncate(text, DEFAULT_MAX_LEN, raw_mode).dimmed());
            }
        }
        ProgressEvent::DownloadPercent { .. } => {
            if let Some(line) = progress_line(tracker) {
                println!("{} {line}", "[PROGRESS]".green().bold());
            }
        }
        ProgressEvent::NowDownloading { .. } => {
            println!(
                "{} {} {}",
                timestamp().dimmed(),
                "[ITEM]".cyan().bold(),
                tracker.label().bold()
            );
        }
        ProgressEvent::PlaylistPosition { current, total } => {
            println!(
                "{} {} item {current}/{total}",
                timestamp().dimmed(),
                "[PLAYLIST]".magenta().bold()
            );
        }
        ProgressEvent::StreamError { message } => print_error(message),
        ProgressEvent::Completed { .. } => print_completed(tracker),
    }
    let _ = io::stdout().flush();
}

/// Print the end-of-job summary.
pub fn print_completed(tracker: &ProgressTracker) {
    let summary = completion_summary(tracker);
    let summary = if tracker.was_cancelled() {
        summary.yellow().to_string()
    } else if tracker.exit_code() == Some(0) && tracker.errors().is_empty() {
        summary.green().to_string()
    } else {
        summary.red().to_string()
    };
    println!("{} {} {summary}", timestamp().dimmed(), "[DONE]".blue().bold());
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}

/// Print a notice about a stop or kill request.
pub fn print_stop_requested(kill: bool) {
    let message = if kill {
        "Killing download tool"
    } else {
        "Stopping, waiting for download tool to exit (Ctrl-C again to kill)"
    };
    println!("{} {}", "[STOP]".yellow().bold(), message);
    let _ = io::stdout().flush();
}
