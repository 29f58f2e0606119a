use super::{StreamKind, TrackRecord};
use crate::analyzer::{FileProbe, StreamInspector};
use crate::error::AppError;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::info;

/// One input file registered with the remux tool
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub path: PathBuf,
    /// Position in the `-i` list of the remux invocation
    pub ordinal: usize,
    pub video_tracks: Vec<TrackRecord>,
    pub audio_tracks: Vec<TrackRecord>,
    pub subtitle_tracks: Vec<TrackRecord>,
    pub duration_secs: Option<f64>,
}

impl FileDescriptor {
    pub fn from_probe(path: PathBuf, ordinal: usize, probe: FileProbe) -> Self {
        Self {
            path,
            ordinal,
            video_tracks: probe.tracks_of(StreamKind::Video),
            audio_tracks: probe.tracks_of(StreamKind::Audio),
            subtitle_tracks: probe.tracks_of(StreamKind::Subtitle),
            duration_secs: probe.duration_secs,
        }
    }

    pub fn tracks(&self, kind: StreamKind) -> &[TrackRecord] {
        match kind {
            StreamKind::Video => &self.video_tracks,
            StreamKind::Audio => &self.audio_tracks,
            StreamKind::Subtitle => &self.subtitle_tracks,
        }
    }

    /// Get the filename
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Probed input files in registration order
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    files: Vec<FileDescriptor>,
}

impl TrackCatalog {
    /// Probe `paths` and assign ordinals in the given order.
    ///
    /// Probes run concurrently since they only read their inputs; the first
    /// failure in registration order is returned.
    pub fn register(inspector: &StreamInspector<'_>, paths: &[PathBuf]) -> Result<Self, AppError> {
        let probes: Vec<Result<FileProbe, AppError>> = thread::scope(|scope| {
            let handles: Vec<_> = paths
                .iter()
                .map(|path| scope.spawn(move || inspector.probe(path)))
                .collect();
            handles
                .into_iter()
                .zip(paths)
                .map(|(handle, path)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(AppError::Probe {
                            path: path.clone(),
                            message: "probe thread panicked".to_string(),
                        })
                    })
                })
                .collect()
        });

        let mut files = Vec::with_capacity(paths.len());
        for (ordinal, (path, probe)) in paths.iter().zip(probes).enumerate() {
            let file = FileDescriptor::from_probe(path.clone(), ordinal, probe?);
            info!(
                "Registered #{} {}: {} video, {} audio, {} subtitle",
                file.ordinal,
                file.filename(),
                file.video_tracks.len(),
                file.audio_tracks.len(),
                file.subtitle_tracks.len()
            );
            files.push(file);
        }

        Ok(Self { files })
    }

    pub fn get(&self, ordinal: usize) -> Option<&FileDescriptor> {
        self.files.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Render a track listing block for one file
pub fn format_tracks(tracks: &[TrackRecord], label: &str, path: &Path) -> String {
    let mut out = format!("\n{} tracks in {}:", capitalize(label), path.display());
    for track in tracks {
        out.push_str("\n  ");
        out.push_str(&track.display_name());
    }
    out
}

pub fn print_tracks(tracks: &[TrackRecord], label: &str, path: &Path) {
    println!("{}", format_tracks(tracks, label, path));
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::{FakeRunner, probe_json};

    fn paths() -> Vec<PathBuf> {
        vec![PathBuf::from("video.mkv"), PathBuf::from("audio.mka")]
    }

    #[test]
    fn test_ordinals_follow_registration_order() {
        let runner = FakeRunner::new()
            .probe(
                "video.mkv",
                probe_json(
                    &[("video", "h264", None), ("audio", "aac", Some("eng"))],
                    Some(60.0),
                ),
            )
            .probe(
                "audio.mka",
                probe_json(&[("audio", "ac3", Some("pol")), ("audio", "aac", None)], None),
            );
        let inspector = StreamInspector::new(&runner, "ffprobe");

        let catalog = TrackCatalog::register(&inspector, &paths()).unwrap();

        assert_eq!(catalog.len(), 2);
        let video = catalog.get(0).unwrap();
        assert_eq!(video.path, PathBuf::from("video.mkv"));
        assert_eq!(video.video_tracks.len(), 1);
        assert_eq!(video.audio_tracks.len(), 1);
        assert_eq!(video.duration_secs, Some(60.0));

        let audio = catalog.get(1).unwrap();
        assert_eq!(audio.ordinal, 1);
        assert_eq!(audio.audio_tracks.len(), 2);
        assert_eq!(audio.audio_tracks[1].language, "und");
        assert!(audio.video_tracks.is_empty());
        assert_eq!(runner.probe_calls(), 2);
    }

    #[test]
    fn test_probe_failure_propagates() {
        let runner = FakeRunner::new().probe("video.mkv", probe_json(&[], None));
        let inspector = StreamInspector::new(&runner, "ffprobe");

        let err = TrackCatalog::register(&inspector, &paths()).unwrap_err();
        match err {
            AppError::Probe { path, .. } => assert_eq!(path, PathBuf::from("audio.mka")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_format_tracks_lists_each_track() {
        let probe = crate::analyzer::ffprobe::parse_probe_output(
            Path::new("audio.mka"),
            &probe_json(&[("audio", "aac", Some("pol"))], None),
        )
        .unwrap();
        let listing = format_tracks(&probe.tracks, "audio", Path::new("audio.mka"));
        assert_eq!(
            listing,
            "\nAudio tracks in audio.mka:\n  Track 0: codec=aac, lang=pol, channels: 2"
        );
    }
}
