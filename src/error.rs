use crate::silence::SilenceStage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing input file or an inconsistent track request
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to probe {}: {message}", path.display())]
    Probe { path: PathBuf, message: String },

    #[error("Silence insertion failed at stage '{stage}': {message}")]
    PipelineStage { stage: SilenceStage, message: String },

    #[error("Remux failed ({}): {stderr}", exit_code_label(*code))]
    RemuxExecution { code: Option<i32>, stderr: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated without exit code".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remux_error_names_exit_code() {
        let err = AppError::RemuxExecution {
            code: Some(1),
            stderr: "Invalid argument".to_string(),
        };
        assert_eq!(err.to_string(), "Remux failed (exit code 1): Invalid argument");
    }

    #[test]
    fn test_stage_error_names_stage() {
        let err = AppError::PipelineStage {
            stage: SilenceStage::TrimAfter,
            message: "ffmpeg exited with code 1".to_string(),
        };
        assert!(err.to_string().contains("trim-after"));
    }
}
