use crate::error::AppError;
use crate::runner::{ToolInvocation, ToolRunner};
use crate::tracks::{StreamKind, TrackRecord, UNDEFINED_LANGUAGE};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Streams and container duration of one file
#[derive(Debug, Clone, Default)]
pub struct FileProbe {
    /// Tracks grouped by kind (video, audio, subtitle), each group in in-type order
    pub tracks: Vec<TrackRecord>,
    pub duration_secs: Option<f64>,
}

impl FileProbe {
    pub fn tracks_of(&self, kind: StreamKind) -> Vec<TrackRecord> {
        self.tracks
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect()
    }
}

/// Probes media files with ffprobe
pub struct StreamInspector<'a> {
    runner: &'a dyn ToolRunner,
    ffprobe: String,
}

impl<'a> StreamInspector<'a> {
    pub fn new(runner: &'a dyn ToolRunner, ffprobe: impl Into<String>) -> Self {
        Self {
            runner,
            ffprobe: ffprobe.into(),
        }
    }

    /// Probe every stream of a file
    pub fn probe(&self, path: &Path) -> Result<FileProbe, AppError> {
        let invocation = ToolInvocation::new(
            self.ffprobe.as_str(),
            [
                "-v".to_string(),
                "error".to_string(),
                "-show_entries".to_string(),
                "stream=index,codec_type,codec_name,channels:stream_tags:format=duration"
                    .to_string(),
                "-of".to_string(),
                "json".to_string(),
                path.to_string_lossy().to_string(),
            ],
        );

        let output = self.runner.run(&invocation).map_err(|e| AppError::Probe {
            path: path.to_path_buf(),
            message: format!("ffprobe {}", e),
        })?;

        let probe = parse_probe_output(path, &output.stdout)?;
        debug!(
            "Probed {}: {} tracks, duration {:?}",
            path.display(),
            probe.tracks.len(),
            probe.duration_secs
        );
        Ok(probe)
    }

    /// Tracks of one kind, in in-type order
    pub fn list_tracks(&self, path: &Path, kind: StreamKind) -> Result<Vec<TrackRecord>, AppError> {
        Ok(self.probe(path)?.tracks_of(kind))
    }
}

/// Parse ffprobe JSON into typed tracks with per-kind ordinals
pub fn parse_probe_output(path: &Path, stdout: &str) -> Result<FileProbe, AppError> {
    let data: ProbeOutput = serde_json::from_str(stdout).map_err(|e| AppError::Probe {
        path: path.to_path_buf(),
        message: format!("Failed to parse ffprobe output: {}", e),
    })?;

    let mut raw: Vec<(StreamKind, usize, RawStream)> = Vec::new();
    for (position, stream) in data.streams.into_iter().enumerate() {
        let Some(kind) = stream.codec_type.as_deref().and_then(StreamKind::from_codec_type) else {
            continue;
        };
        let container_index = stream.index.unwrap_or(position);
        raw.push((kind, container_index, stream));
    }

    // Stable sort keeps ffprobe's order for streams reporting the same index
    raw.sort_by_key(|(kind, container_index, _)| (*kind, *container_index));

    let mut tracks = Vec::with_capacity(raw.len());
    let mut counts: BTreeMap<StreamKind, usize> = BTreeMap::new();
    for (kind, container_index, stream) in raw {
        let ordinal = counts.entry(kind).or_insert(0);
        let tags = stream.tags.unwrap_or_default();
        tracks.push(TrackRecord {
            index: *ordinal,
            container_index,
            codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
            kind,
            channels: stream.channels,
            language: tags
                .get("language")
                .filter(|l| !l.is_empty())
                .cloned()
                .unwrap_or_else(|| UNDEFINED_LANGUAGE.to_string()),
            tags,
        });
        *ordinal += 1;
    }

    let duration_secs = data
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    Ok(FileProbe {
        tracks,
        duration_secs,
    })
}

// JSON deserialization structures

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<RawStream>,
    format: Option<FormatInfo>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    index: Option<usize>,
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u16>,
    tags: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::FakeRunner;

    const MIXED: &str = r#"{
        "streams": [
            { "index": 0, "codec_name": "eac3", "codec_type": "audio", "channels": 6,
              "tags": { "language": "eng", "title": "Surround" } },
            { "index": 1, "codec_name": "h264", "codec_type": "video" },
            { "index": 2, "codec_name": "aac", "codec_type": "audio", "channels": 2 },
            { "index": 3, "codec_name": "subrip", "codec_type": "subtitle",
              "tags": { "language": "pol" } },
            { "index": 4, "codec_name": "ttf", "codec_type": "attachment" }
        ],
        "format": { "filename": "movie.mkv", "duration": "5400.250000" }
    }"#;

    #[test]
    fn test_in_type_index_counts_same_kind_only() {
        let probe = parse_probe_output(Path::new("movie.mkv"), MIXED).unwrap();

        let video = probe.tracks_of(StreamKind::Video);
        assert_eq!(video.len(), 1);
        assert_eq!(video[0].index, 0);
        assert_eq!(video[0].container_index, 1);

        let audio = probe.tracks_of(StreamKind::Audio);
        assert_eq!(
            audio.iter().map(|t| (t.index, t.container_index)).collect::<Vec<_>>(),
            vec![(0, 0), (1, 2)]
        );
        assert_eq!(audio[0].channels, Some(6));
        assert_eq!(audio[0].title(), Some("Surround"));

        let subs = probe.tracks_of(StreamKind::Subtitle);
        assert_eq!(subs[0].index, 0);
        assert_eq!(subs[0].language, "pol");
    }

    #[test]
    fn test_missing_language_defaults_to_und() {
        let probe = parse_probe_output(Path::new("movie.mkv"), MIXED).unwrap();
        let audio = probe.tracks_of(StreamKind::Audio);
        assert_eq!(audio[1].language, "und");
        assert!(audio[1].tags.is_empty());
    }

    #[test]
    fn test_out_of_order_streams_are_sorted() {
        let json = r#"{ "streams": [
            { "index": 3, "codec_name": "ac3", "codec_type": "audio" },
            { "index": 1, "codec_name": "aac", "codec_type": "audio" }
        ] }"#;
        let probe = parse_probe_output(Path::new("a.mka"), json).unwrap();
        assert_eq!(probe.tracks[0].codec, "aac");
        assert_eq!(probe.tracks[0].index, 0);
        assert_eq!(probe.tracks[1].codec, "ac3");
        assert_eq!(probe.tracks[1].index, 1);
    }

    #[test]
    fn test_duration_is_parsed() {
        let probe = parse_probe_output(Path::new("movie.mkv"), MIXED).unwrap();
        assert_eq!(probe.duration_secs, Some(5400.25));
    }

    #[test]
    fn test_empty_document_has_no_tracks() {
        let probe = parse_probe_output(Path::new("empty.mkv"), "{}").unwrap();
        assert!(probe.tracks.is_empty());
        assert_eq!(probe.duration_secs, None);
    }

    #[test]
    fn test_malformed_output_is_probe_error() {
        let err = parse_probe_output(Path::new("x.mkv"), "Invalid data found").unwrap_err();
        assert!(matches!(err, AppError::Probe { .. }));
    }

    #[test]
    fn test_probe_failure_is_probe_error() {
        let runner = FakeRunner::new();
        let inspector = StreamInspector::new(&runner, "ffprobe");
        let err = inspector.probe(Path::new("missing.mkv")).unwrap_err();
        match err {
            AppError::Probe { path, message } => {
                assert_eq!(path, Path::new("missing.mkv"));
                assert!(message.contains("exited with code 1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_list_tracks_filters_by_kind() {
        let runner = FakeRunner::new().probe("movie.mkv", MIXED);
        let inspector = StreamInspector::new(&runner, "ffprobe");
        let subs = inspector
            .list_tracks(Path::new("movie.mkv"), StreamKind::Subtitle)
            .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].codec, "subrip");
        let call = &runner.calls()[0];
        assert_eq!(call.args.last().map(String::as_str), Some("movie.mkv"));
        assert!(call.args.contains(&"json".to_string()));
    }
}
