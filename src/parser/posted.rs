use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use thiserror::Error;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("no count in relative time phrase {0:?}")]
    MissingCount(String),
    #[error("relative time phrase {0:?} is out of range")]
    OutOfRange(String),
}

/// Resolve a relative phrase ("3 hours ago", "yesterday") against `now`.
///
/// Rules apply in order: "yesterday", then "hour", then "day", otherwise
/// `now`. A phrase containing both "hour" and "day" resolves as hours.
pub fn try_resolve(phrase: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let delta = if phrase.contains("yesterday") {
        TimeDelta::days(1)
    } else if phrase.contains("hour") {
        TimeDelta::try_hours(first_number(phrase)?)
            .ok_or_else(|| TimeParseError::OutOfRange(phrase.to_string()))?
    } else if phrase.contains("day") {
        TimeDelta::try_days(first_number(phrase)?)
            .ok_or_else(|| TimeParseError::OutOfRange(phrase.to_string()))?
    } else {
        // "just now", "30 minutes ago", ...
        return Ok(now);
    };

    now.checked_sub_signed(delta)
        .ok_or_else(|| TimeParseError::OutOfRange(phrase.to_string()))
}

fn first_number(phrase: &str) -> Result<i64, TimeParseError> {
    let m = NUMBER_RE
        .find(phrase)
        .ok_or_else(|| TimeParseError::MissingCount(phrase.to_string()))?;
    m.as_str()
        .parse()
        .map_err(|_| TimeParseError::OutOfRange(phrase.to_string()))
}
