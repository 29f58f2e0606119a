use super::StreamKind;
use std::fmt;

/// Which stream of a file to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRef {
    /// The file's video, addressed positionally by file ordinal alone
    Video,
    Audio(usize),
    Subtitle(usize),
}

impl TrackRef {
    pub fn kind(&self) -> StreamKind {
        match self {
            TrackRef::Video => StreamKind::Video,
            TrackRef::Audio(_) => StreamKind::Audio,
            TrackRef::Subtitle(_) => StreamKind::Subtitle,
        }
    }
}

/// One stream to include in the output, rendered as an ffmpeg `-map` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSelector {
    pub file: usize,
    pub track: TrackRef,
}

impl TrackSelector {
    pub fn video(file: usize) -> Self {
        Self {
            file,
            track: TrackRef::Video,
        }
    }

    pub fn audio(file: usize, index: usize) -> Self {
        Self {
            file,
            track: TrackRef::Audio(index),
        }
    }

    pub fn subtitle(file: usize, index: usize) -> Self {
        Self {
            file,
            track: TrackRef::Subtitle(index),
        }
    }
}

impl fmt::Display for TrackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.track {
            TrackRef::Video => write!(f, "{}", self.file),
            TrackRef::Audio(index) | TrackRef::Subtitle(index) => {
                write!(f, "{}:{}:{}", self.file, self.track.kind().specifier(), index)
            }
        }
    }
}
