//! dlp-supervisor - Supervised yt-dlp downloads with live progress events.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dlp_supervisor::cli::{classify_all, AudioFormat, Browser, VideoFormat};
use dlp_supervisor::config::{Config, ConfigLoader};
use dlp_supervisor::display;
use dlp_supervisor::supervisor::{ProgressTracker, Supervisor, SupervisorOptions};

/// Exit code used when the job was cancelled from the terminal.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "dlp-supervisor",
    about = "Supervised yt-dlp downloads with live progress",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (defaults to ./.dlp-supervisor.toml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a URL with yt-dlp and show progress.
    Download {
        /// The URL to download.
        url: String,
        /// Directory to save into.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Output filename template.
        #[arg(short, long)]
        template: Option<String>,
        /// Browser to read cookies from.
        #[arg(long, value_enum)]
        browser: Option<Browser>,
        /// Download audio only.
        #[arg(long)]
        audio_only: bool,
        /// Audio format.
        #[arg(long, value_enum)]
        audio_format: Option<AudioFormat>,
        /// Audio quality code (0 is best).
        #[arg(long)]
        audio_quality: Option<String>,
        /// Video format.
        #[arg(long, value_enum)]
        video_format: Option<VideoFormat>,
        /// Simulate the download without writing files.
        #[arg(long)]
        simulate: bool,
        /// Download tool executable.
        #[arg(long)]
        binary: Option<String>,
        /// Print tool output without truncation.
        #[arg(long)]
        raw: bool,
        /// Hide raw tool output.
        #[arg(short, long)]
        quiet: bool,
    },
    /// Classify tool output read from stdin and print events as JSON lines.
    Parse,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Option<Config> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => Some(config),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(config) = load_config(cli.config) else {
        return ExitCode::FAILURE;
    };

    match cli.command {
        Commands::Download {
            url,
            output_dir,
            template,
            browser,
            audio_only,
            audio_format,
            audio_quality,
            video_format,
            simulate,
            binary,
            raw,
            quiet,
        } => {
            let defaults = &config.download;
            let mut args = defaults
                .to_args(url)
                .audio_only(audio_only || defaults.audio_only)
                .simulate(simulate);
            if let Some(dir) = output_dir {
                args = args.output_dir(dir);
            }
            if let Some(template) = template {
                args = args.output_template(template);
            }
            if let Some(browser) = browser {
                args = args.browser(browser);
            }
            if let Some(format) = audio_format {
                args = args.audio_format(format);
            }
            if let Some(quality) = audio_quality {
                args = args.audio_quality(quality);
            }
            if let Some(format) = video_format {
                args = args.video_format(format);
            }
            if let Some(binary) = binary {
                args = args.program(binary);
            }

            tracing::info!(
                url = %args.url(),
                simulate,
                output = %args.output_path().display(),
                "Starting download"
            );
            display::print_command(&args.display_command());

            let supervisor = Supervisor::with_options(SupervisorOptions::from(&config.supervisor));
            run_download(
                &supervisor,
                args.build_args(),
                raw || config.display.raw,
                quiet || config.display.quiet,
            )
            .await
        }
        Commands::Parse => parse_stdin().await,
    }
}

async fn run_download(
    supervisor: &Supervisor,
    arguments: Vec<String>,
    raw: bool,
    quiet: bool,
) -> ExitCode {
    let (handle, mut events) = match supervisor.start(arguments) {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "Could not start download");
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let control = handle.stop_handle();
    let mut tracker = ProgressTracker::new();
    let mut interrupts = 0u8;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                tracker.apply(&event);
                display::print_event(&event, &tracker, raw, quiet);
            }
            signal = tokio::signal::ctrl_c(), if interrupts < 2 => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    interrupts = 2;
                    continue;
                }
                interrupts += 1;
                let kill = interrupts > 1;
                display::print_stop_requested(kill);
                if kill {
                    control.kill();
                } else {
                    control.stop();
                }
            }
        }
    }

    let outcome = match handle.wait().await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Download job failed");
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if !tracker.is_completed() {
        tracing::warn!("Event stream closed without a completion event");
    }
    tracing::info!(
        lines = tracker.lines(),
        exit_code = ?outcome.exit_code,
        last_percent = ?tracker.percent(),
        item = ?tracker.current_item(),
        errors = tracker.errors().len(),
        "Download finished"
    );

    if outcome.cancelled {
        return ExitCode::from(EXIT_CANCELLED);
    }
    match outcome.exit_code {
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

async fn parse_stdin() -> ExitCode {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                for event in classify_all(&line) {
                    match serde_json::to_string(&event) {
                        Ok(json) => println!("{json}"),
                        Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
                    }
                }
            }
            Ok(None) => return ExitCode::SUCCESS,
            Err(e) => {
                display::print_error(&format!("Failed to read stdin: {e}"));
                return ExitCode::FAILURE;
            }
        }
    }
}
