mod analyzer;
mod app;
mod config;
mod error;
mod remux;
mod runner;
mod silence;
mod tracks;
mod utils;

use anyhow::{Context, bail};
use app::{App, Mode, Outcome};
use clap::{ArgAction, Parser};
use config::{AppConfig, RemuxDefaults, ScratchPolicy};
use remux::{Realignment, RemuxRequest};
use runner::process::ProcessRunner;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug};
use utils::{check_tools, init_logging, interrupt, parse_timecode};

/// Remux an external audio track (and optional subtitles) into a video file
#[derive(Debug, Parser)]
#[command(name = "trackmux", version, about)]
struct Cli {
    /// File holding the audio track to add
    #[arg(long)]
    audio_input: PathBuf,

    /// File providing the video stream and the output name
    #[arg(long)]
    video_input: PathBuf,

    /// File holding the subtitle track to add
    #[arg(long = "sub-input")]
    sub_input: Option<PathBuf>,

    /// Directory receiving the remuxed file
    #[arg(long)]
    output_folder: Option<PathBuf>,

    /// Only list available tracks
    #[arg(long)]
    list_tracks: bool,

    /// Audio track index within the audio input
    #[arg(long, default_value_t = 0)]
    audio_track: usize,

    /// Subtitle track index within the subtitle input
    #[arg(long = "sub-track")]
    sub_track: Option<usize>,

    /// Audio delay in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    audio_offset: Option<i64>,

    /// Subtitle delay in milliseconds
    #[arg(long = "sub-offset", allow_negative_numbers = true)]
    sub_offset: Option<i64>,

    #[arg(long)]
    audio_lang: Option<String>,

    #[arg(long = "sub-lang")]
    sub_lang: Option<String>,

    #[arg(long)]
    audio_title: Option<String>,

    #[arg(long = "sub-title")]
    sub_title: Option<String>,

    /// Where to insert silence into the audio (mm:ss, hh:mm:ss or seconds)
    #[arg(long, value_parser = parse_point, requires = "silence_duration")]
    silence_point: Option<Duration>,

    /// Seconds of silence to insert
    #[arg(long, requires = "silence_point")]
    silence_duration: Option<f64>,

    /// What to do with intermediate files
    #[arg(long, value_enum)]
    scratch: Option<ScratchPolicy>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_point(s: &str) -> Result<Duration, String> {
    parse_timecode(s).map_err(|e| e.to_string())
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn mode(&self) -> Mode {
        if self.list_tracks {
            Mode::ListTracks
        } else {
            Mode::Remux
        }
    }

    /// Merge command line values over configured defaults
    fn to_request(&self, defaults: &RemuxDefaults) -> RemuxRequest {
        let output_dir = self
            .output_folder
            .clone()
            .unwrap_or_else(|| PathBuf::from(&defaults.output_folder));

        let mut request = RemuxRequest::new(&self.audio_input, &self.video_input, output_dir);
        request.subtitle_input = self.sub_input.clone();
        request.audio_track = self.audio_track;
        request.subtitle_track = self.sub_track;
        request.audio_lang = self
            .audio_lang
            .clone()
            .unwrap_or_else(|| defaults.audio_lang.clone());
        request.sub_lang = self
            .sub_lang
            .clone()
            .unwrap_or_else(|| defaults.sub_lang.clone());
        request.audio_title = self
            .audio_title
            .clone()
            .unwrap_or_else(|| defaults.audio_title.clone());
        request.sub_title = self
            .sub_title
            .clone()
            .unwrap_or_else(|| defaults.sub_title.clone());
        request.audio_offset_ms = self.audio_offset;
        request.subtitle_offset_ms = self.sub_offset;
        request.realign = match (self.silence_point, self.silence_duration) {
            (Some(point), Some(silence_secs)) => Some(Realignment { point, silence_secs }),
            _ => None,
        };
        request
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_level());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.validate()?;
    check_tools(&config.tools)?;

    let cancel_flag = interrupt::install_handler();
    let runner = ProcessRunner::new(cancel_flag).with_timeout(config.tool_timeout());

    let request = cli.to_request(&config.defaults);
    debug!("Request: {:?}", request);

    let mut app = App::new(&runner, &config);
    if let Some(policy) = cli.scratch {
        app = app.with_scratch_policy(policy);
    }

    match app.run(request, cli.mode()) {
        Ok(Outcome::Listed) => Ok(()),
        Ok(Outcome::Remuxed(output)) => {
            debug!("Finished {}", output.display());
            Ok(())
        }
        Err(e) if interrupt::is_cancelled() => bail!("Interrupted: {}", e),
        Err(e) => Err(e.into()),
    }
}
