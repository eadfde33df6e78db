//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::{
    AudioFormat, Browser, DownloadArgs, VideoFormat, DEFAULT_AUDIO_QUALITY,
    DEFAULT_OUTPUT_TEMPLATE, DEFAULT_PROGRAM,
};
use crate::supervisor::{SupervisorOptions, DEFAULT_TERMINATE_TIMEOUT};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for download options.
    pub download: DownloadDefaults,
    /// Job supervision settings.
    pub supervisor: SupervisorSettings,
    /// Terminal output settings.
    pub display: DisplaySettings,
}

/// Default download options, overridable per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadDefaults {
    /// Download tool executable.
    pub program: String,
    /// Directory downloads are saved into. Falls back to the user's
    /// download directory.
    pub output_dir: Option<PathBuf>,
    /// Output filename template.
    pub output_template: String,
    /// Browser to read cookies from.
    pub browser: Browser,
    /// Download audio only.
    pub audio_only: bool,
    /// Audio format.
    pub audio_format: AudioFormat,
    /// Audio quality code.
    pub audio_quality: String,
    /// Video format.
    pub video_format: VideoFormat,
}

impl Default for DownloadDefaults {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            output_dir: None,
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            browser: Browser::None,
            audio_only: false,
            audio_format: AudioFormat::Default,
            audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
            video_format: VideoFormat::Default,
        }
    }
}

impl DownloadDefaults {
    /// The configured output directory, or `~/Downloads`.
    #[must_use]
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Start an argument builder for `url` populated from these defaults.
    #[must_use]
    pub fn to_args(&self, url: impl Into<String>) -> DownloadArgs {
        DownloadArgs::new(url, self.resolved_output_dir())
            .program(self.program.clone())
            .output_template(self.output_template.clone())
            .browser(self.browser)
            .audio_only(self.audio_only)
            .audio_format(self.audio_format)
            .audio_quality(self.audio_quality.clone())
            .video_format(self.video_format)
    }
}

/// Job supervision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Seconds between SIGTERM and SIGKILL when a job is killed.
    pub terminate_timeout_secs: u64,
    /// Working directory for the spawned tool.
    pub working_dir: Option<PathBuf>,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            terminate_timeout_secs: DEFAULT_TERMINATE_TIMEOUT.as_secs(),
            working_dir: None,
        }
    }
}

impl From<&SupervisorSettings> for SupervisorOptions {
    fn from(settings: &SupervisorSettings) -> Self {
        Self {
            terminate_timeout: Duration::from_secs(settings.terminate_timeout_secs),
            working_dir: settings.working_dir.clone(),
        }
    }
}

/// Terminal output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Print tool output untruncated.
    pub raw: bool,
    /// Hide raw tool output and show only parsed progress.
    pub quiet: bool,
}
