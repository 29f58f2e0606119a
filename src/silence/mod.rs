//! Re-aligns an audio track by splicing synthesized silence into it.
//!
//! The audio is cut at the insertion point with stream copies, a silent
//! segment is generated in a matching format, and the three parts are joined
//! with ffmpeg's concat demuxer. Only the silent segment is ever encoded.

pub mod workspace;

pub use workspace::ScratchSpace;

use crate::analyzer::StreamInspector;
use crate::config::ToolConfig;
use crate::error::AppError;
use crate::runner::{ToolInvocation, ToolRunner};
use crate::tracks::{StreamKind, TrackRecord};
use crate::utils::format_seconds;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Steps of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceStage {
    TrimBefore,
    TrimAfter,
    SynthesizeSilence,
    Concatenate,
}

impl SilenceStage {
    pub fn name(&self) -> &'static str {
        match self {
            SilenceStage::TrimBefore => "trim-before",
            SilenceStage::TrimAfter => "trim-after",
            SilenceStage::SynthesizeSilence => "synthesize-silence",
            SilenceStage::Concatenate => "concatenate",
        }
    }
}

impl fmt::Display for SilenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Encoder settings for the generated silence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceProfile {
    pub encoder: &'static str,
    pub sample_rate: u32,
    pub channel_layout: &'static str,
}

impl SilenceProfile {
    /// Match the silence to the source track so the parts can be concatenated
    /// without re-encoding. Unknown codecs get 48 kHz stereo AAC.
    pub fn for_track(track: Option<&TrackRecord>) -> Self {
        let (encoder, sample_rate) = match track.map(|t| t.codec.as_str()) {
            Some("aac") => ("aac", 48_000),
            Some("ac3") => ("ac3", 48_000),
            Some("eac3") => ("eac3", 48_000),
            Some("mp3") => ("mp3", 44_100),
            Some("opus") => ("libopus", 48_000),
            Some("flac") => ("flac", 48_000),
            _ => ("aac", 48_000),
        };
        let channel_layout = match track.and_then(|t| t.channels) {
            Some(1) => "mono",
            Some(6) => "5.1",
            Some(8) => "7.1",
            _ => "stereo",
        };
        Self {
            encoder,
            sample_rate,
            channel_layout,
        }
    }

    /// lavfi source description for ffmpeg's `anullsrc`
    pub fn source(&self) -> String {
        format!("anullsrc=r={}:cl={}", self.sample_rate, self.channel_layout)
    }
}

/// Insert `silence` seconds of silence into `audio_file` at `insert_point`.
///
/// Returns the path of the shifted audio inside the scratch directory. On
/// failure, part files already written stay in the scratch directory.
pub fn insert_silence(
    runner: &dyn ToolRunner,
    tools: &ToolConfig,
    audio_file: &Path,
    insert_point: Duration,
    silence: f64,
    scratch: &ScratchSpace,
) -> Result<PathBuf, AppError> {
    if !silence.is_finite() || silence <= 0.0 {
        return Err(AppError::validation(format!(
            "Silence duration must be a positive number of seconds, got {}",
            silence
        )));
    }

    let inspector = StreamInspector::new(runner, tools.ffprobe.as_str());
    let audio_tracks = inspector.list_tracks(audio_file, StreamKind::Audio)?;
    let profile = SilenceProfile::for_track(audio_tracks.first());
    info!(
        "Inserting {:.3}s of silence at {} into {} ({} {} Hz {})",
        silence,
        format_seconds(insert_point),
        audio_file.display(),
        profile.encoder,
        profile.sample_rate,
        profile.channel_layout
    );

    let part1 = scratch.file("audio_part1.mka");
    let part2 = scratch.file("audio_part2.mka");
    let silence_part = scratch.file("silence.mka");
    let concat_list = scratch.file("concat.txt");
    let stem = audio_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    let out_file = scratch.file(&format!("{}_with_silence.mka", stem));
    debug!("Scratch files in {}", scratch.path().display());

    let point = format_seconds(insert_point);
    let input = path_arg(audio_file);

    let stages = [
        (
            SilenceStage::TrimBefore,
            ffmpeg(tools, &["-i", &input, "-t", &point, "-c", "copy", &path_arg(&part1)]),
        ),
        (
            SilenceStage::TrimAfter,
            ffmpeg(tools, &["-i", &input, "-ss", &point, "-c", "copy", &path_arg(&part2)]),
        ),
        (
            SilenceStage::SynthesizeSilence,
            ffmpeg(
                tools,
                &[
                    "-f",
                    "lavfi",
                    "-t",
                    &format!("{:.3}", silence),
                    "-i",
                    &profile.source(),
                    "-c:a",
                    profile.encoder,
                    &path_arg(&silence_part),
                ],
            ),
        ),
    ];

    for (stage, invocation) in &stages {
        run_stage(runner, *stage, invocation)?;
    }

    std::fs::write(
        &concat_list,
        concat_manifest(&[part1.as_path(), silence_part.as_path(), part2.as_path()]),
    )
    .map_err(|e| AppError::PipelineStage {
        stage: SilenceStage::Concatenate,
        message: format!("failed to write {}: {}", concat_list.display(), e),
    })?;

    let concat = ffmpeg(
        tools,
        &[
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            &path_arg(&concat_list),
            "-c",
            "copy",
            &path_arg(&out_file),
        ],
    );
    run_stage(runner, SilenceStage::Concatenate, &concat)?;

    info!("Shifted audio written to {}", out_file.display());
    Ok(out_file)
}

fn ffmpeg(tools: &ToolConfig, args: &[&str]) -> ToolInvocation {
    ToolInvocation::new(
        tools.ffmpeg.as_str(),
        std::iter::once("-y").chain(args.iter().copied()),
    )
}

fn run_stage(
    runner: &dyn ToolRunner,
    stage: SilenceStage,
    invocation: &ToolInvocation,
) -> Result<(), AppError> {
    info!("Silence stage {}: {}", stage, invocation);
    runner
        .run(invocation)
        .map(|_| ())
        .map_err(|e| AppError::PipelineStage {
            stage,
            message: format!("{} {}", invocation.program, e),
        })
}

/// Concat demuxer list, one quoted `file` line per part
pub fn concat_manifest(parts: &[&Path]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", path_arg(p).replace('\'', r"'\''")))
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
