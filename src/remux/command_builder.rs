use super::request::RemuxRequest;
use crate::analyzer::StreamInspector;
use crate::error::AppError;
use crate::runner::ToolInvocation;
use crate::tracks::{FileDescriptor, StreamKind, TrackCatalog, TrackSelector};
use crate::utils::format_offset_ms;
use std::path::PathBuf;
use tracing::{debug, info};

/// One `-i` entry of the remux invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInput {
    pub path: PathBuf,
    /// Emitted as `-itsoffset` before the input when non-zero
    pub start_delay_ms: Option<i64>,
}

/// A `-metadata:s:<kind>:<index> key=value` directive on an output stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMetadata {
    pub kind: StreamKind,
    /// Output in-type index of the stream
    pub index: usize,
    pub key: &'static str,
    pub value: String,
}

impl StreamMetadata {
    fn args(&self) -> [String; 2] {
        [
            format!("-metadata:s:{}:{}", self.kind.specifier(), self.index),
            format!("{}={}", self.key, self.value),
        ]
    }
}

/// The complete stream-copy remux, as data
#[derive(Debug, Clone, PartialEq)]
pub struct RemuxPlan {
    pub inputs: Vec<PlannedInput>,
    pub selectors: Vec<TrackSelector>,
    /// File ordinal supplying global metadata and chapters
    pub metadata_source: usize,
    pub metadata: Vec<StreamMetadata>,
    pub output: PathBuf,
}

impl RemuxPlan {
    /// ffmpeg arguments in invocation order
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        for input in &self.inputs {
            if let Some(ms) = input.start_delay_ms.filter(|ms| *ms != 0) {
                args.extend(["-itsoffset".to_string(), format_offset_ms(ms)]);
            }
            args.extend(["-i".to_string(), input.path.to_string_lossy().to_string()]);
        }

        for selector in &self.selectors {
            args.extend(["-map".to_string(), selector.to_string()]);
        }

        args.extend([
            "-map_metadata".to_string(),
            self.metadata_source.to_string(),
            "-map_chapters".to_string(),
            self.metadata_source.to_string(),
            "-c".to_string(),
            "copy".to_string(),
        ]);

        for directive in &self.metadata {
            args.extend(directive.args());
        }

        args.push(self.output.to_string_lossy().to_string());
        args
    }

    pub fn invocation(&self, ffmpeg: &str) -> ToolInvocation {
        ToolInvocation::new(ffmpeg, self.args())
    }
}

/// Probe the request's inputs and build the remux plan.
///
/// The video file is registered first (ordinal 0), then the audio file and
/// the subtitle file if present.
pub fn build_plan(
    request: &RemuxRequest,
    inspector: &StreamInspector<'_>,
) -> Result<RemuxPlan, AppError> {
    request.validate()?;

    let mut paths = vec![request.video_input.clone(), request.audio_input.clone()];
    if let Some(subtitle) = &request.subtitle_input {
        paths.push(subtitle.clone());
    }

    let catalog = TrackCatalog::register(inspector, &paths)?;
    plan_from_catalog(request, &catalog)
}

/// Build the plan from an already registered catalog
pub fn plan_from_catalog(
    request: &RemuxRequest,
    catalog: &TrackCatalog,
) -> Result<RemuxPlan, AppError> {
    let video_file = registered(catalog, 0)?;
    let audio_file = registered(catalog, 1)?;
    let subtitle_file = match request.subtitle_input {
        Some(_) => Some(registered(catalog, 2)?),
        None => None,
    };

    if video_file.video_tracks.is_empty() {
        return Err(AppError::validation(format!(
            "{} contains no video stream",
            video_file.path.display()
        )));
    }
    ensure_track(audio_file, StreamKind::Audio, request.audio_track)?;

    let mut inputs = vec![
        PlannedInput {
            path: video_file.path.clone(),
            start_delay_ms: None,
        },
        PlannedInput {
            path: audio_file.path.clone(),
            start_delay_ms: request.audio_offset_ms,
        },
    ];
    let mut selectors = vec![
        TrackSelector::video(video_file.ordinal),
        TrackSelector::audio(audio_file.ordinal, request.audio_track),
    ];

    // The video file's own streams are all kept, so added streams land after them
    let new_audio_index = video_file.audio_tracks.len();
    let mut metadata = language_and_title(
        StreamKind::Audio,
        new_audio_index,
        &request.audio_lang,
        &request.audio_title,
    );

    if let Some(subtitle_file) = subtitle_file {
        let index = request.subtitle_track_or_default();
        ensure_track(subtitle_file, StreamKind::Subtitle, index)?;

        inputs.push(PlannedInput {
            path: subtitle_file.path.clone(),
            start_delay_ms: request.subtitle_offset_ms,
        });
        selectors.push(TrackSelector::subtitle(subtitle_file.ordinal, index));

        let new_sub_index = video_file.subtitle_tracks.len();
        metadata.extend(language_and_title(
            StreamKind::Subtitle,
            new_sub_index,
            &request.sub_lang,
            &request.sub_title,
        ));
    }

    let plan = RemuxPlan {
        inputs,
        selectors,
        metadata_source: video_file.ordinal,
        metadata,
        output: request.output_file(),
    };

    info!(
        "Planned remux of {} streams into {} (new audio at a:{})",
        plan.selectors.len(),
        plan.output.display(),
        new_audio_index
    );
    debug!("Remux arguments: {:?}", plan.args());
    Ok(plan)
}

fn registered(catalog: &TrackCatalog, ordinal: usize) -> Result<&FileDescriptor, AppError> {
    catalog.get(ordinal).ok_or_else(|| {
        AppError::validation(format!("no input registered with ordinal {}", ordinal))
    })
}

fn ensure_track(file: &FileDescriptor, kind: StreamKind, index: usize) -> Result<(), AppError> {
    let available = file.tracks(kind).len();
    if index >= available {
        return Err(AppError::validation(format!(
            "{} track {} requested but {} has {} {} track(s)",
            kind,
            index,
            file.path.display(),
            available,
            kind
        )));
    }
    Ok(())
}

fn language_and_title(
    kind: StreamKind,
    index: usize,
    language: &str,
    title: &str,
) -> Vec<StreamMetadata> {
    vec![
        StreamMetadata {
            kind,
            index,
            key: "language",
            value: language.to_string(),
        },
        StreamMetadata {
            kind,
            index,
            key: "title",
            value: title_case(title),
        },
    ]
}

/// Capitalise the first letter of every word and lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
