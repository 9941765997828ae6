//! Validation and formatting for description authoring.

use thiserror::Error;

/// Minimum length of a description, after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Authoring validation errors, shown to the person editing descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("Please enter valid timestamps.")]
    InvalidTimestamps,

    #[error("End timestamp must be greater than start timestamp.")]
    EndNotAfterStart,

    #[error("Timestamps cannot be negative.")]
    NegativeTimestamp,

    #[error("Description cannot be empty.")]
    EmptyDescription,

    #[error("Description must be at least 10 characters long.")]
    DescriptionTooShort,
}

/// Validate start/end timestamp inputs given in whole seconds.
pub fn validate_timestamps(start: &str, end: &str) -> Result<(i64, i64), AuthoringError> {
    let start: i64 = start
        .trim()
        .parse()
        .map_err(|_| AuthoringError::InvalidTimestamps)?;
    let end: i64 = end
        .trim()
        .parse()
        .map_err(|_| AuthoringError::InvalidTimestamps)?;

    if end <= start {
        return Err(AuthoringError::EndNotAfterStart);
    }
    if start < 0 || end < 0 {
        return Err(AuthoringError::NegativeTimestamp);
    }

    Ok((start, end))
}

/// Validate description text.
pub fn validate_description(text: &str) -> Result<(), AuthoringError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AuthoringError::EmptyDescription);
    }
    if trimmed.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(AuthoringError::DescriptionTooShort);
    }
    Ok(())
}

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour on.
pub fn format_timestamp(seconds: u64) -> String {
    let (hours, minutes, secs) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Parse `m:ss` or `h:mm:ss` into seconds. Malformed input yields 0.
pub fn parse_timestamp(text: &str) -> u64 {
    let fields: Option<Vec<u64>> = text.split(':').map(|p| p.trim().parse().ok()).collect();
    match fields.as_deref() {
        Some([mins, secs]) => mins * 60 + secs,
        Some([hours, mins, secs]) => hours * 3600 + mins * 60 + secs,
        _ => 0,
    }
}
