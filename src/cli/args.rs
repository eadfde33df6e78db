//! Argument vector construction for the download tool.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default executable name.
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Default output filename template.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Default audio quality code (best).
pub const DEFAULT_AUDIO_QUALITY: &str = "0";

/// Flags always passed before any user option.
const BASE_FLAGS: [&str; 5] = [
    "--abort-on-error",
    "--no-colors",
    "--abort-on-unavailable-fragments",
    "--no-continue",
    "--newline",
];

/// Error returned when parsing an option value fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported {kind}: {value}")]
pub struct UnknownOption {
    kind: &'static str,
    value: String,
}

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                #[value(name = $text)]
                $variant
            ),+
        }

        impl $name {
            /// Every supported value, in display order.
            pub const ALL: &'static [Self] = &[$( Self::$variant ),+];

            /// The value as passed on the command line.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lowered)
                    .ok_or_else(|| UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

option_enum! {
    /// Browser to read cookies from.
    #[derive(Default)]
    Browser, "browser" {
        #[default]
        None => "none",
        Brave => "brave",
        Chrome => "chrome",
        Chromium => "chromium",
        Edge => "edge",
        Firefox => "firefox",
        Opera => "opera",
        Safari => "safari",
        Vivaldi => "vivaldi",
    }
}

option_enum! {
    /// Audio format for extraction.
    #[derive(Default)]
    AudioFormat, "audio format" {
        #[default]
        Default => "default",
        Aac => "aac",
        Flac => "flac",
        Mp3 => "mp3",
        M4a => "m4a",
        Opus => "opus",
        Vorbis => "vorbis",
        Wav => "wav",
    }
}

option_enum! {
    /// Video format selector.
    #[derive(Default)]
    VideoFormat, "video format" {
        #[default]
        Default => "default",
        Bestvideo => "bestvideo",
        Worstvideo => "worstvideo",
        Best => "best",
        Worst => "worst",
        Mp4 => "mp4",
        Flv => "flv",
        Webm => "webm",
        Mkv => "mkv",
    }
}

/// Builder for the download tool's argument vector.
///
/// The first element of the built vector is the program itself.
#[derive(Debug, Clone)]
pub struct DownloadArgs {
    program: String,
    url: String,
    output_dir: PathBuf,
    output_template: String,
    browser: Browser,
    audio_only: bool,
    audio_format: AudioFormat,
    audio_quality: String,
    video_format: VideoFormat,
    simulate: bool,
}

impl DownloadArgs {
    /// Create a builder for `url` saving into `output_dir`.
    #[must_use]
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            url: url.into(),
            output_dir: output_dir.into(),
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            browser: Browser::None,
            audio_only: false,
            audio_format: AudioFormat::Default,
            audio_quality: DEFAULT_AUDIO_QUALITY.to_string(),
            video_format: VideoFormat::Default,
            simulate: false,
        }
    }

    /// Use a different executable.
    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the directory downloads are saved into.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the output filename template. An empty template keeps the default.
    #[must_use]
    pub fn output_template(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        self.output_template = if template.is_empty() {
            DEFAULT_OUTPUT_TEMPLATE.to_string()
        } else {
            template
        };
        self
    }

    /// Read cookies from a browser.
    #[must_use]
    pub fn browser(mut self, browser: Browser) -> Self {
        self.browser = browser;
        self
    }

    /// Download audio only.
    #[must_use]
    pub fn audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    /// Set the audio format.
    #[must_use]
    pub fn audio_format(mut self, format: AudioFormat) -> Self {
        self.audio_format = format;
        self
    }

    /// Set the audio quality code used with audio-only downloads.
    #[must_use]
    pub fn audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.audio_quality = quality.into();
        self
    }

    /// Set the video format.
    #[must_use]
    pub fn video_format(mut self, format: VideoFormat) -> Self {
        self.video_format = format;
        self
    }

    /// Only simulate the download.
    #[must_use]
    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Get the URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full output path template: directory joined with the filename template.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_template)
    }

    /// Build the argument vector, program first and URL last.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        if self.simulate {
            args.insert(1, "--simulate".to_string());
        }
        args
    }

    /// The command line as echoed to the user, without the simulate flag.
    #[must_use]
    pub fn display_command(&self) -> String {
        self.base_args().join(" ")
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![self.program.clone()];
        args.extend(BASE_FLAGS.iter().map(|s| (*s).to_string()));

        if self.browser != Browser::None {
            args.push("--cookies-from-browser".to_string());
            args.push(self.browser.to_string());
        }

        if self.audio_only {
            args.push("--no-video".to_string());
            args.push("--extract-audio".to_string());
            args.push("--audio-quality".to_string());
            args.push(self.audio_quality.clone());
        }

        if self.audio_format != AudioFormat::Default {
            args.push("--audio-format".to_string());
            args.push(self.audio_format.to_string());
        }

        if self.video_format != VideoFormat::Default {
            args.push("--format".to_string());
            args.push(self.video_format.to_string());
        }

        args.push("--output".to_string());
        args.push(self.output_path().to_string_lossy().into_owned());
        args.push(self.url.clone());
        args
    }
}
