//! Description segments and segment-list ingestion.
//!
//! A description segment is a time-bounded unit of narration text tied to a
//! video. The sync engine consumes a [`SegmentList`], which is validated and
//! sorted once at ingestion and then treated as read-only for the session.

pub mod authoring;
pub mod record;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use authoring::{
    format_timestamp, parse_timestamp, validate_description, validate_timestamps, AuthoringError,
    MIN_DESCRIPTION_CHARS,
};
pub use record::{select_primary_author, DescriptionRecord, Timestamp};

/// Identifier of a description record, unique within a video.
pub type DescriptionId = u64;

/// Segment data errors. Offending segments are dropped at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    #[error("Segment {id} has no narration text")]
    MissingText { id: DescriptionId },

    #[error("Segment {id} is missing its {field} timestamp")]
    MissingTimestamp {
        id: DescriptionId,
        field: &'static str,
    },

    #[error("Segment {id} has an unreadable timestamp: {value}")]
    InvalidTimestamp { id: DescriptionId, value: String },

    #[error("Segment {id} starts before zero ({start}s)")]
    NegativeStart { id: DescriptionId, start: f64 },

    #[error("Segment {id} has non-positive duration [{start}s, {end}s)")]
    NonPositiveDuration {
        id: DescriptionId,
        start: f64,
        end: f64,
    },
}

/// A narration unit covering the half-open interval `[start_seconds, end_seconds)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionSegment {
    /// Opaque identifier
    pub id: DescriptionId,
    /// Text to narrate
    pub text: String,
    /// Range start in seconds (inclusive)
    pub start_seconds: f64,
    /// Range end in seconds (exclusive)
    pub end_seconds: f64,
}

impl DescriptionSegment {
    /// Create a new segment. Validation happens at ingestion, not here.
    pub fn new(id: DescriptionId, text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id,
            text: text.into(),
            start_seconds: start,
            end_seconds: end,
        }
    }

    /// Check the data-model invariant `end > start >= 0` and non-empty text.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.text.trim().is_empty() {
            return Err(SegmentError::MissingText { id: self.id });
        }
        if !self.start_seconds.is_finite() || !self.end_seconds.is_finite() {
            return Err(SegmentError::InvalidTimestamp {
                id: self.id,
                value: format!("{}..{}", self.start_seconds, self.end_seconds),
            });
        }
        if self.start_seconds < 0.0 {
            return Err(SegmentError::NegativeStart {
                id: self.id,
                start: self.start_seconds,
            });
        }
        if self.end_seconds <= self.start_seconds {
            return Err(SegmentError::NonPositiveDuration {
                id: self.id,
                start: self.start_seconds,
                end: self.end_seconds,
            });
        }
        Ok(())
    }

    /// Whether `time_seconds` falls inside the half-open range.
    pub fn contains(&self, time_seconds: f64) -> bool {
        time_seconds >= self.start_seconds && time_seconds < self.end_seconds
    }

    /// Range duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Validated segments sorted by start time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentList {
    segments: Vec<DescriptionSegment>,
}

impl SegmentList {
    /// Empty list (synchronization never triggers).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate and sort segments. Invalid segments are dropped with a warning.
    pub fn from_segments(segments: impl IntoIterator<Item = DescriptionSegment>) -> Self {
        let mut kept: Vec<DescriptionSegment> = segments
            .into_iter()
            .filter(|segment| match segment.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Dropping description segment: {}", e);
                    false
                }
            })
            .collect();

        // Stable sort keeps input order for identical ranges
        kept.sort_by(|a, b| {
            a.start_seconds
                .total_cmp(&b.start_seconds)
                .then(a.end_seconds.total_cmp(&b.end_seconds))
        });

        for pair in kept.windows(2) {
            if pair[1].start_seconds < pair[0].end_seconds {
                tracing::warn!(
                    "Description segments {} and {} overlap; the earlier one wins",
                    pair[0].id,
                    pair[1].id
                );
            }
        }

        Self { segments: kept }
    }

    /// Convert storage records into segments, dropping unusable ones.
    pub fn from_records(records: impl IntoIterator<Item = DescriptionRecord>) -> Self {
        let segments = records
            .into_iter()
            .filter_map(|record| match record.into_segment() {
                Ok(segment) => Some(segment),
                Err(e) => {
                    tracing::warn!("Dropping description record: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        Self::from_segments(segments)
    }

    /// Number of eligible segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether there are no eligible segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at a sorted index.
    pub fn get(&self, index: usize) -> Option<&DescriptionSegment> {
        self.segments.get(index)
    }

    /// Iterate segments in start order.
    pub fn iter(&self) -> impl Iterator<Item = &DescriptionSegment> {
        self.segments.iter()
    }

    /// Index of the first segment whose range contains `time_seconds`.
    pub fn find_containing(&self, time_seconds: f64) -> Option<usize> {
        self.segments
            .iter()
            .take_while(|s| s.start_seconds <= time_seconds)
            .position(|s| s.contains(time_seconds))
    }

    /// End of the last segment, if any.
    pub fn last_end_seconds(&self) -> Option<f64> {
        self.segments
            .iter()
            .map(|s| s.end_seconds)
            .max_by(|a, b| a.total_cmp(b))
    }
}
