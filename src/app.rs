use crate::analyzer::StreamInspector;
use crate::config::{AppConfig, ScratchPolicy};
use crate::error::AppError;
use crate::remux::{self, RemuxRequest};
use crate::runner::ToolRunner;
use crate::silence::{self, ScratchSpace};
use crate::tracks::{StreamKind, print_tracks};
use crate::utils::format_duration;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Allowed drift between expected and measured duration after silence insertion
const DURATION_TOLERANCE_SECS: f64 = 1.0;

/// What a run should do once inputs are prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print available tracks and stop
    ListTracks,
    /// Build and execute the remux
    Remux,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Listed,
    Remuxed(PathBuf),
}

/// Drives one invocation: validation, optional silence insertion, then
/// listing or remuxing
pub struct App<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a AppConfig,
    scratch_policy: ScratchPolicy,
}

impl<'a> App<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a AppConfig) -> Self {
        Self {
            runner,
            config,
            scratch_policy: config.scratch.policy,
        }
    }

    pub fn with_scratch_policy(mut self, policy: ScratchPolicy) -> Self {
        self.scratch_policy = policy;
        self
    }

    fn inspector(&self) -> StreamInspector<'a> {
        StreamInspector::new(self.runner, self.config.tools.ffprobe.as_str())
    }

    pub fn run(&self, mut request: RemuxRequest, mode: Mode) -> Result<Outcome, AppError> {
        request.validate()?;
        std::fs::create_dir_all(&request.output_dir)?;

        let scratch = match request.realign {
            Some(_) => Some(ScratchSpace::create(&request.output_dir, self.scratch_policy)?),
            None => None,
        };

        let result = self.run_with_scratch(&mut request, mode, scratch.as_ref());

        if let Some(scratch) = scratch {
            scratch.finish(result.is_ok());
        }
        result
    }

    fn run_with_scratch(
        &self,
        request: &mut RemuxRequest,
        mode: Mode,
        scratch: Option<&ScratchSpace>,
    ) -> Result<Outcome, AppError> {
        if let (Some(realign), Some(scratch)) = (request.realign, scratch) {
            let shifted = silence::insert_silence(
                self.runner,
                &self.config.tools,
                &request.audio_input,
                realign.point,
                realign.silence_secs,
                scratch,
            )?;
            self.verify_shift(&request.audio_input, &shifted, realign.silence_secs);
            request.audio_input = shifted;
        }

        match mode {
            Mode::ListTracks => {
                self.list_tracks(request)?;
                Ok(Outcome::Listed)
            }
            Mode::Remux => {
                let plan = remux::build_plan(request, &self.inspector())?;
                let output = remux::execute(self.runner, &plan, &self.config.tools.ffmpeg)?;
                Ok(Outcome::Remuxed(output))
            }
        }
    }

    /// Print audio and subtitle tracks of every input
    pub fn list_tracks(&self, request: &RemuxRequest) -> Result<(), AppError> {
        let inspector = self.inspector();
        let audio = inspector.probe(&request.audio_input)?;
        let video = inspector.probe(&request.video_input)?;

        print_tracks(&audio.tracks_of(StreamKind::Audio), "audio", &request.audio_input);
        print_tracks(&video.tracks_of(StreamKind::Audio), "audio", &request.video_input);
        if let Some(subtitle_input) = &request.subtitle_input {
            let subs = inspector.list_tracks(subtitle_input, StreamKind::Subtitle)?;
            print_tracks(&subs, "subtitle", subtitle_input);
        }
        print_tracks(
            &video.tracks_of(StreamKind::Subtitle),
            "Video::subtitle",
            &request.video_input,
        );
        print_tracks(
            &audio.tracks_of(StreamKind::Subtitle),
            "Audio::subtitle",
            &request.audio_input,
        );
        Ok(())
    }

    /// Warn when the shifted audio is not `silence` seconds longer than the
    /// original. Returns the measured drift, if both durations are known.
    fn verify_shift(&self, original: &Path, shifted: &Path, silence: f64) -> Option<f64> {
        let inspector = self.inspector();
        let durations = inspector
            .probe(original)
            .and_then(|o| inspector.probe(shifted).map(|s| (o.duration_secs, s.duration_secs)));

        match durations {
            Ok((Some(before), Some(after))) => {
                let expected = before + silence;
                let drift = after - expected;
                if drift.abs() > DURATION_TOLERANCE_SECS {
                    warn!(
                        "Shifted audio lasts {:.1}s, expected {:.1}s (diff: {:.1}s)",
                        after, expected, drift
                    );
                } else {
                    info!(
                        "Shifted audio duration {} matches",
                        format_duration(Duration::from_secs_f64(after.max(0.0)))
                    );
                }
                Some(drift)
            }
            Ok(_) => {
                warn!("Could not verify shifted audio duration: not reported by ffprobe");
                None
            }
            Err(e) => {
                warn!("Could not verify shifted audio duration: {}", e);
                None
            }
        }
    }
}
