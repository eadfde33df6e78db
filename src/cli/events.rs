//! Event types derived from the download tool's output.
//!
//! Every line the tool prints becomes a [`ProgressEvent::RawLine`]; lines
//! with a recognized shape additionally produce one of the structured
//! variants. A job always ends with exactly one [`ProgressEvent::Completed`].

use serde::{Deserialize, Serialize};

/// Events emitted while supervising a download job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Overall download percentage of the current item.
    DownloadPercent {
        /// Percentage in `[0, 100]`.
        value: f64,
    },
    /// The tool started working on a new item.
    NowDownloading {
        /// Item identifier with its trailing separator stripped.
        identifier: String,
    },
    /// Position inside a playlist.
    PlaylistPosition {
        /// 1-based index of the current item.
        current: u32,
        /// Number of items in the playlist.
        total: u32,
    },
    /// A line of output, forwarded verbatim without its terminator.
    RawLine {
        /// The line text.
        text: String,
    },
    /// Reading output or waiting for the process failed.
    StreamError {
        /// Human-readable description of the failure.
        message: String,
    },
    /// The job finished. Always the last event of a job.
    Completed {
        /// Exit code, if the process exited normally and was reaped.
        exit_code: Option<i32>,
        /// Whether the job was stopped or killed on request.
        cancelled: bool,
    },
}

impl ProgressEvent {
    /// Returns true if this is the terminal event of a job.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns true for events parsed out of a line.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Self::DownloadPercent { .. } | Self::NowDownloading { .. } | Self::PlaylistPosition { .. }
        )
    }

    /// Returns the line text if this is a `RawLine` event.
    #[must_use]
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::RawLine { text } => Some(text),
            _ => None,
        }
    }
}
