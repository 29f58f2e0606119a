use humansize::{DECIMAL, format_size};
use std::time::Duration;

/// Format a byte count for display ("1.23 GB")
pub fn format_file_size(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a duration as `H:MM:SS` or `M:SS`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
