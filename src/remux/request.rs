use crate::error::AppError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Container of every remuxed file
pub const OUTPUT_CONTAINER: &str = "mkv";

/// Where and how much silence to splice into the audio before remuxing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Realignment {
    pub point: Duration,
    pub silence_secs: f64,
}

/// Everything needed to combine one video, one audio and an optional subtitle file
#[derive(Debug, Clone)]
pub struct RemuxRequest {
    pub audio_input: PathBuf,
    pub video_input: PathBuf,
    pub subtitle_input: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// In-type index of the audio track taken from `audio_input`
    pub audio_track: usize,
    /// In-type index of the subtitle track; only valid with `subtitle_input`
    pub subtitle_track: Option<usize>,
    pub audio_lang: String,
    pub sub_lang: String,
    pub audio_title: String,
    pub sub_title: String,
    pub audio_offset_ms: Option<i64>,
    pub subtitle_offset_ms: Option<i64>,
    pub realign: Option<Realignment>,
}

impl RemuxRequest {
    /// A request for audio track 0 with no offsets and undefined languages
    pub fn new(
        audio_input: impl Into<PathBuf>,
        video_input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            audio_input: audio_input.into(),
            video_input: video_input.into(),
            subtitle_input: None,
            output_dir: output_dir.into(),
            audio_track: 0,
            subtitle_track: None,
            audio_lang: "und".to_string(),
            sub_lang: "und".to_string(),
            audio_title: String::new(),
            sub_title: String::new(),
            audio_offset_ms: None,
            subtitle_offset_ms: None,
            realign: None,
        }
    }

    /// Check the request before any external tool runs
    pub fn validate(&self) -> Result<(), AppError> {
        let mut inputs: Vec<(&Path, &str)> = vec![
            (self.audio_input.as_path(), "Audio input"),
            (self.video_input.as_path(), "Video input"),
        ];
        if let Some(subtitle) = &self.subtitle_input {
            inputs.push((subtitle.as_path(), "Subtitle input"));
        }

        for (path, desc) in &inputs {
            if !path.is_file() {
                return Err(AppError::validation(format!(
                    "{} file does not exist: {}",
                    desc,
                    path.display()
                )));
            }
        }

        // ffmpeg cannot write over one of its own inputs
        if let Ok(output) = self.output_file().canonicalize() {
            for (path, desc) in &inputs {
                if path.canonicalize().is_ok_and(|p| p == output) {
                    return Err(AppError::validation(format!(
                        "Output file {} would overwrite the {}",
                        output.display(),
                        desc.to_lowercase()
                    )));
                }
            }
        }

        if self.subtitle_input.is_none() {
            if let Some(index) = self.subtitle_track {
                return Err(AppError::validation(format!(
                    "Subtitle track {} requested but no subtitle input was given",
                    index
                )));
            }
            if self.subtitle_offset_ms.is_some_and(|ms| ms != 0) {
                return Err(AppError::validation(
                    "Subtitle offset given but no subtitle input was given",
                ));
            }
        }

        if self.audio_lang.trim().is_empty() {
            return Err(AppError::validation("Audio language must not be empty"));
        }
        if self.subtitle_input.is_some() && self.sub_lang.trim().is_empty() {
            return Err(AppError::validation("Subtitle language must not be empty"));
        }

        if let Some(realign) = &self.realign
            && (!realign.silence_secs.is_finite() || realign.silence_secs <= 0.0)
        {
            return Err(AppError::validation(format!(
                "Silence duration must be a positive number of seconds, got {}",
                realign.silence_secs
            )));
        }

        Ok(())
    }

    /// `<output_dir>/<video stem>.mkv`
    pub fn output_file(&self) -> PathBuf {
        let stem = self
            .video_input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        self.output_dir.join(format!("{}.{}", stem, OUTPUT_CONTAINER))
    }

    /// Subtitle index to use, defaulting to the first track
    pub fn subtitle_track_or_default(&self) -> usize {
        self.subtitle_track.unwrap_or(0)
    }
}
