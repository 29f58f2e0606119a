pub mod catalog;
pub mod selection;

pub use catalog::{FileDescriptor, TrackCatalog, print_tracks};
pub use selection::{TrackRef, TrackSelector};

use std::collections::BTreeMap;
use std::fmt;

/// Stream category as reported by ffprobe's `codec_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

impl StreamKind {
    /// Map an ffprobe codec_type; data and attachment streams yield `None`
    pub fn from_codec_type(codec_type: &str) -> Option<Self> {
        match codec_type {
            "video" => Some(StreamKind::Video),
            "audio" => Some(StreamKind::Audio),
            "subtitle" => Some(StreamKind::Subtitle),
            _ => None,
        }
    }

    /// Stream specifier letter used by ffmpeg (`a` in `1:a:0`)
    pub fn specifier(&self) -> char {
        match self {
            StreamKind::Video => 'v',
            StreamKind::Audio => 'a',
            StreamKind::Subtitle => 's',
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Language used when a stream carries no language tag
pub const UNDEFINED_LANGUAGE: &str = "und";

/// One stream inside a media file
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    /// Position among streams of the same kind (what `-map 0:a:N` addresses)
    pub index: usize,
    /// Raw stream index inside the container
    pub container_index: usize,
    pub codec: String,
    pub kind: StreamKind,
    pub channels: Option<u16>,
    pub language: String,
    pub tags: BTreeMap<String, String>,
}

impl TrackRecord {
    pub fn display_name(&self) -> String {
        let extra = match self.kind {
            StreamKind::Audio => match self.channels {
                Some(channels) => format!(", channels: {}", channels),
                None => ", channels: ?".to_string(),
            },
            _ => String::new(),
        };
        format!(
            "Track {}: codec={}, lang={}{}",
            self.index, self.codec, self.language, extra
        )
    }

    pub fn title(&self) -> Option<&str> {
        self.tags.get("title").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(kind: StreamKind, channels: Option<u16>) -> TrackRecord {
        TrackRecord {
            index: 1,
            container_index: 2,
            codec: "ac3".to_string(),
            kind,
            channels,
            language: "eng".to_string(),
            tags: BTreeMap::new(),
        }
    }

    #[test]
    fn test_audio_display_includes_channels() {
        assert_eq!(
            track(StreamKind::Audio, Some(6)).display_name(),
            "Track 1: codec=ac3, lang=eng, channels: 6"
        );
        assert_eq!(
            track(StreamKind::Audio, None).display_name(),
            "Track 1: codec=ac3, lang=eng, channels: ?"
        );
    }

    #[test]
    fn test_subtitle_display_omits_channels() {
        assert_eq!(
            track(StreamKind::Subtitle, None).display_name(),
            "Track 1: codec=ac3, lang=eng"
        );
    }

    #[test]
    fn test_unknown_codec_type_is_ignored() {
        assert_eq!(StreamKind::from_codec_type("attachment"), None);
        assert_eq!(StreamKind::from_codec_type("audio"), Some(StreamKind::Audio));
    }
}
