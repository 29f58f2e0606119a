use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Defaults for remux metadata and output location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemuxDefaults {
    /// Language code tagged on the added audio stream
    pub audio_lang: String,
    /// Language code tagged on the added subtitle stream
    pub sub_lang: String,
    /// Display title of the added audio stream
    pub audio_title: String,
    /// Display title of the added subtitle stream
    pub sub_title: String,
    /// Directory receiving the remuxed file
    pub output_folder: String,
}

impl Default for RemuxDefaults {
    fn default() -> Self {
        Self {
            audio_lang: "pol".to_string(),
            sub_lang: "pol".to_string(),
            audio_title: "Polish".to_string(),
            sub_title: "Polish".to_string(),
            output_folder: "output".to_string(),
        }
    }
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    /// Kill any single tool invocation running longer than this
    pub timeout_secs: Option<u64>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            timeout_secs: None,
        }
    }
}

/// What happens to the silence-insertion scratch directory after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScratchPolicy {
    /// Always keep the part files
    Retain,
    /// Always delete the scratch directory
    Purge,
    /// Keep the part files only when the run failed
    #[default]
    RetainOnFailure,
}

impl ScratchPolicy {
    pub fn should_purge(&self, succeeded: bool) -> bool {
        match self {
            ScratchPolicy::Retain => false,
            ScratchPolicy::Purge => true,
            ScratchPolicy::RetainOnFailure => succeeded,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    pub policy: ScratchPolicy,
}
