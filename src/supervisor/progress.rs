//! Observer-side progress aggregation.

use serde::Serialize;

use crate::cli::ProgressEvent;

/// Snapshot of a job's progress, folded from its events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressTracker {
    percent: Option<f64>,
    current_item: Option<String>,
    playlist_current: Option<u32>,
    playlist_total: Option<u32>,
    lines: usize,
    errors: Vec<String>,
    completed: Option<(Option<i32>, bool)>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the snapshot.
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DownloadPercent { value } => self.percent = Some(*value),
            ProgressEvent::NowDownloading { identifier } => {
                self.current_item = Some(identifier.clone());
            }
            ProgressEvent::PlaylistPosition { current, total } => {
                self.playlist_current = Some(*current);
                self.playlist_total = Some(*total);
            }
            ProgressEvent::RawLine { .. } => self.lines = self.lines.saturating_add(1),
            ProgressEvent::StreamError { message } => self.errors.push(message.clone()),
            ProgressEvent::Completed {
                exit_code,
                cancelled,
            } => self.completed = Some((*exit_code, *cancelled)),
        }
    }

    /// Last reported percentage, rounded to a whole number for a bar.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent_rounded(&self) -> Option<u8> {
        self.percent.map(|p| p.round().clamp(0.0, 100.0) as u8)
    }

    /// Last reported percentage.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.percent
    }

    /// Identifier of the item being downloaded.
    #[must_use]
    pub fn current_item(&self) -> Option<&str> {
        self.current_item.as_deref()
    }

    /// Playlist `(current, total)` once a position has been reported.
    #[must_use]
    pub fn playlist(&self) -> Option<(u32, u32)> {
        self.playlist_current.zip(self.playlist_total)
    }

    /// Number of raw lines seen.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Diagnostics reported by the supervisor.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether the terminal event has been seen.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Exit code carried by the terminal event.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.completed.and_then(|(code, _)| code)
    }

    /// Whether the job ended on request.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.completed.is_some_and(|(_, cancelled)| cancelled)
    }

    /// Tooltip-style label for the current item.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Downloading: {}", self.current_item.as_deref().unwrap_or(""))
    }
}
