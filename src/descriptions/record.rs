//! Wire format of description records returned by the storage service.

use super::{DescriptionId, DescriptionSegment, SegmentError};
use serde::{Deserialize, Serialize};

/// A timestamp as sent by the service: a number, or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(f64),
    Text(String),
}

impl Timestamp {
    /// Seconds value, if readable.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Timestamp::Seconds(s) => Some(*s),
            Timestamp::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Seconds(s) => write!(f, "{}", s),
            Timestamp::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Description record as stored by the description service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    /// Record identifier
    pub id: DescriptionId,
    /// Text revisions, oldest first
    #[serde(default)]
    pub text_history: Vec<String>,
    /// Editors of each revision
    #[serde(default)]
    pub username_history: Vec<String>,
    /// Author, when the service reports one directly
    #[serde(default)]
    pub username: Option<String>,
    /// Range start
    #[serde(default)]
    pub timestamp_start: Option<Timestamp>,
    /// Range end
    #[serde(default)]
    pub timestamp_end: Option<Timestamp>,
}

impl DescriptionRecord {
    /// Combined narration text: the revision history joined with spaces.
    pub fn narration_text(&self) -> String {
        self.text_history
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Author of the record, if known.
    pub fn author(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or_else(|| self.username_history.first().map(String::as_str))
    }

    /// Convert into a validated segment.
    pub fn into_segment(self) -> Result<DescriptionSegment, SegmentError> {
        let start = read_timestamp(self.id, "start", self.timestamp_start.as_ref())?;
        let end = read_timestamp(self.id, "end", self.timestamp_end.as_ref())?;
        let segment = DescriptionSegment::new(self.id, self.narration_text(), start, end);
        segment.validate()?;
        Ok(segment)
    }
}

fn read_timestamp(
    id: DescriptionId,
    field: &'static str,
    value: Option<&Timestamp>,
) -> Result<f64, SegmentError> {
    let value = value.ok_or(SegmentError::MissingTimestamp { id, field })?;
    value.seconds().ok_or_else(|| SegmentError::InvalidTimestamp {
        id,
        value: value.to_string(),
    })
}

/// Keep only the records written by the first author seen.
///
/// Records without any author information are kept when no author is known.
pub fn select_primary_author(records: Vec<DescriptionRecord>) -> Vec<DescriptionRecord> {
    let primary = match records.iter().find_map(|r| r.author()) {
        Some(author) => author.to_string(),
        None => return records,
    };

    records
        .into_iter()
        .filter(|r| r.author() == Some(primary.as_str()))
        .collect()
}
