pub mod types;

pub use types::*;

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Metadata and output defaults
    pub defaults: RemuxDefaults,
    /// External tools
    pub tools: ToolConfig,
    /// Silence-insertion scratch handling
    pub scratch: ScratchConfig,
}

impl AppConfig {
    /// Load configuration from `path` (or the default location).
    ///
    /// A missing default config is created for future editing; an explicit
    /// path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        if let Some(path) = path {
            let config = Self::load_from_file(path)?;
            info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from_file(&config_path) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    return Ok(config);
                }
                Err(e) => {
                    warn!("Failed to load config: {}. Using defaults.", e);
                    return Ok(Self::default());
                }
            }
        }

        let config = Self::default();
        // Save default config for future editing
        if let Err(e) = config.save_to(&config_path) {
            warn!("Failed to save default config: {}", e);
        }
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to(&self, config_path: &Path) -> Result<(), AppError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(config_path, toml_string)
            .map_err(|e| AppError::Config(format!("Failed to write config file: {}", e)))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Load configuration from a specific file
    fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackmux")
            .join("config.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tools.ffmpeg.trim().is_empty() || self.tools.ffprobe.trim().is_empty() {
            return Err(AppError::Config(
                "ffmpeg and ffprobe paths must not be empty".to_string(),
            ));
        }
        if self.tools.timeout_secs == Some(0) {
            return Err(AppError::Config(
                "Tool timeout must be at least 1 second".to_string(),
            ));
        }
        if self.defaults.audio_lang.trim().is_empty() || self.defaults.sub_lang.trim().is_empty()
        {
            return Err(AppError::Config(
                "Default language codes must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tools.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_polish_release_workflow() {
        let config = AppConfig::default();
        assert_eq!(config.defaults.audio_lang, "pol");
        assert_eq!(config.defaults.sub_title, "Polish");
        assert_eq!(config.defaults.output_folder, "output");
        assert_eq!(config.scratch.policy, ScratchPolicy::RetainOnFailure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\naudio_lang = \"eng\"\n\n[scratch]\npolicy = \"purge\"\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.defaults.audio_lang, "eng");
        assert_eq!(config.defaults.audio_title, "Polish");
        assert_eq!(config.tools.ffmpeg, "ffmpeg");
        assert_eq!(config.scratch.policy, ScratchPolicy::Purge);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.tools.timeout_secs = Some(600);
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.tool_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.tools.timeout_secs = Some(0);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/trackmux.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_scratch_policy() {
        assert!(!ScratchPolicy::RetainOnFailure.should_purge(false));
        assert!(ScratchPolicy::RetainOnFailure.should_purge(true));
        assert!(ScratchPolicy::Purge.should_purge(false));
        assert!(!ScratchPolicy::Retain.should_purge(true));
    }
}
