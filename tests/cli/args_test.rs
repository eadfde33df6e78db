//! Tests for download tool argument construction.

use std::path::PathBuf;

use dlp_supervisor::cli::{AudioFormat, Browser, DownloadArgs, VideoFormat, DEFAULT_OUTPUT_TEMPLATE};

fn output(dir: &str) -> String {
    PathBuf::from(dir)
        .join(DEFAULT_OUTPUT_TEMPLATE)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn builder_minimal_order() {
    let args = DownloadArgs::new("https://example.com/watch?v=1", "/out").build_args();

    assert_eq!(
        args,
        vec![
            "yt-dlp".to_string(),
            "--abort-on-error".to_string(),
            "--no-colors".to_string(),
            "--abort-on-unavailable-fragments".to_string(),
            "--no-continue".to_string(),
            "--newline".to_string(),
            "--output".to_string(),
            output("/out"),
            "https://example.com/watch?v=1".to_string(),
        ]
    );
}

#[test]
fn builder_full_order_with_simulate() {
    let args = DownloadArgs::new("https://u", "/out")
        .browser(Browser::Firefox)
        .audio_only(true)
        .audio_format(AudioFormat::Mp3)
        .video_format(VideoFormat::Mp4)
        .simulate(true)
        .build_args();

    let expected: Vec<String> = [
        "yt-dlp",
        "--simulate",
        "--abort-on-error",
        "--no-colors",
        "--abort-on-unavailable-fragments",
        "--no-continue",
        "--newline",
        "--cookies-from-browser",
        "firefox",
        "--no-video",
        "--extract-audio",
        "--audio-quality",
        "0",
        "--audio-format",
        "mp3",
        "--format",
        "mp4",
        "--output",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .chain([output("/out"), "https://u".to_string()])
    .collect();

    assert_eq!(args, expected);
}

#[test]
fn builder_no_browser_flag_for_none() {
    let args = DownloadArgs::new("u", "/out")
        .browser(Browser::None)
        .build_args();
    assert!(!args.contains(&"--cookies-from-browser".to_string()));
}

#[test]
fn builder_audio_format_without_audio_only() {
    let args = DownloadArgs::new("u", "/out")
        .audio_format(AudioFormat::Flac)
        .build_args();

    assert!(args.contains(&"--audio-format".to_string()));
    assert!(!args.contains(&"--extract-audio".to_string()));
}

#[test]
fn builder_custom_quality_and_template() {
    let args = DownloadArgs::new("u", "/out")
        .audio_only(true)
        .audio_quality("5")
        .output_template("%(id)s.%(ext)s")
        .build_args();

    let quality = args.iter().position(|a| a == "--audio-quality").unwrap();
    assert_eq!(args[quality + 1], "5");
    let out = args.iter().position(|a| a == "--output").unwrap();
    assert!(args[out + 1].ends_with("%(id)s.%(ext)s"));
}

#[test]
fn builder_url_is_last() {
    let args = DownloadArgs::new("https://last", "/out")
        .video_format(VideoFormat::Best)
        .simulate(true)
        .build_args();
    assert_eq!(args.last().map(String::as_str), Some("https://last"));
}

#[test]
fn display_command_omits_simulate() {
    let args = DownloadArgs::new("u", "/out").simulate(true);
    assert!(!args.display_command().contains("--simulate"));
    assert!(args.display_command().starts_with("yt-dlp --abort-on-error"));
    assert_eq!(args.build_args()[1], "--simulate");
}

#[test]
fn builder_custom_program() {
    let args = DownloadArgs::new("u", "/out")
        .program("/usr/local/bin/yt-dlp")
        .simulate(true)
        .build_args();
    assert_eq!(args[0], "/usr/local/bin/yt-dlp");
    assert_eq!(args[1], "--simulate");
}

#[test]
fn builder_is_clone() {
    let builder = DownloadArgs::new("u", "/out").browser(Browser::Brave);
    let cloned = builder.clone();
    assert_eq!(builder.build_args(), cloned.build_args());
}
