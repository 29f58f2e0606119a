use crate::config::ToolConfig;
use crate::error::AppError;
use std::process::{Command, Stdio};

/// Ensure ffmpeg and ffprobe can be started
pub fn check_tools(tools: &ToolConfig) -> Result<(), AppError> {
    let missing: Vec<&str> = [tools.ffmpeg.as_str(), tools.ffprobe.as_str()]
        .into_iter()
        .filter(|tool| !check_command(tool, &["-version"]))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "required tools not found or not runnable: {}",
            missing.join(", ")
        )))
    }
}

/// Check if a command is available
fn check_command(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}
