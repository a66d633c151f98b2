//! Custom validation functions shared by the runner configuration and the
//! scenario checks.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Pattern every validator, node, application and cheat name must match.
pub const NAME_PATTERN: &str = r"^[A-Za-z0-9.-]+$";

lazy_static! {
    static ref NAME_RE: Result<Regex, regex::Error> = Regex::new(NAME_PATTERN);
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.as_ref().is_ok_and(|re| re.is_match(name))
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Errors for an optional `[start, end]` interval within a scenario of the
/// given duration. Missing start means 0, missing end means the duration.
pub(crate) fn check_time_interval(
    start: Option<f32>,
    end: Option<f32>,
    duration: f32,
) -> Vec<String> {
    let start = start.unwrap_or(0.0);
    let end = end.unwrap_or(duration);
    let mut errs = Vec::new();
    if start < 0.0 {
        errs.push(format!("start time must be >= 0, is {start}"));
    }
    if start > duration {
        errs.push(format!(
            "start time must be <= scenario duration (={duration}s), is {start}"
        ));
    }
    if end < start {
        errs.push(format!(
            "end time must be >= start time, end={end}s, start={start}s"
        ));
    } else if end > duration {
        errs.push(format!(
            "end time must be <= scenario duration, end={end}s, duration={duration}s"
        ));
    }
    errs
}
