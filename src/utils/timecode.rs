use crate::error::AppError;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<h>\d+):)?(?P<m>\d+):(?P<s>\d{1,2}(?:\.\d+)?)$").expect("valid regex")
});

static SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));

/// Parse `MM:SS`, `HH:MM:SS` or plain seconds into a duration
pub fn parse_timecode(input: &str) -> Result<Duration, AppError> {
    let input = input.trim();
    let invalid = || {
        AppError::validation(format!(
            "Invalid time format '{}', expected MM:SS",
            input
        ))
    };

    if SECONDS.is_match(input) {
        let secs: f64 = input.parse().map_err(|_| invalid())?;
        return Duration::try_from_secs_f64(secs).map_err(|_| invalid());
    }

    let caps = CLOCK.captures(input).ok_or_else(invalid)?;
    let hours: u64 = match caps.name("h") {
        Some(h) => h.as_str().parse().map_err(|_| invalid())?,
        None => 0,
    };
    let minutes: u64 = caps["m"].parse().map_err(|_| invalid())?;
    let seconds: f64 = caps["s"].parse().map_err(|_| invalid())?;

    if seconds >= 60.0 || (caps.name("h").is_some() && minutes >= 60) {
        return Err(invalid());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .ok_or_else(invalid)?;
    let fraction = Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;
    Duration::from_secs(whole)
        .checked_add(fraction)
        .ok_or_else(invalid)
}

/// Seconds with millisecond precision, as passed to ffmpeg time options
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// A millisecond offset as signed seconds (`-250` becomes `-0.250`)
pub fn format_offset_ms(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let abs = ms.unsigned_abs();
    format!("{}{}.{:03}", sign, abs / 1000, abs % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_seconds() {
        assert_eq!(parse_timecode("12:34").unwrap(), Duration::from_secs(754));
        assert_eq!(parse_timecode("0:05").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_minutes_may_exceed_an_hour() {
        assert_eq!(parse_timecode("75:00").unwrap(), Duration::from_secs(4500));
    }

    #[test]
    fn test_hours_minutes_seconds() {
        assert_eq!(parse_timecode("1:02:03").unwrap(), Duration::from_secs(3723));
    }

    #[test]
    fn test_plain_and_fractional_seconds() {
        assert_eq!(parse_timecode("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_timecode("1:30.5").unwrap(), Duration::from_millis(90_500));
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in [
            "",
            "abc",
            "1:75",
            "1:2:3:4",
            "-5",
            "1:60:00",
            "99999999999999999999999",
            "9999999999999999999:00:00",
            "999999999999999999999:00",
        ] {
            assert!(
                matches!(parse_timecode(bad), Err(AppError::Validation(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(754_000)), "754.000");
        assert_eq!(format_seconds(Duration::from_millis(2_500)), "2.500");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset_ms(1500), "1.500");
        assert_eq!(format_offset_ms(-250), "-0.250");
        assert_eq!(format_offset_ms(42), "0.042");
    }
}
