//! Range Tracker
//!
//! Pure decision function evaluated on every time sample. It decides which
//! range playback is in, whether this is a fresh entry, and whether narration
//! should start. Narration starts at most once per continuous dwell.

use super::state::PlaybackState;
use crate::descriptions::SegmentList;

/// One evaluated time sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time in seconds, already truncated to the clock granularity
    pub time: f64,
    /// Whether the playback surface reports paused
    pub surface_paused: bool,
    /// Whether description narration is switched on
    pub enabled: bool,
}

/// Outcome of evaluating a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// Replacement playback state
    pub state: PlaybackState,
    /// Range to start narrating
    pub trigger: Option<usize>,
    /// The surface is playing while a continuing narration owns it
    pub enforce_pause: bool,
    /// Range whose description should be shown; `None` shows the placeholder
    pub display: Option<usize>,
}

/// Evaluate one time sample against the previous state.
pub fn track(sample: Sample, segments: &SegmentList, previous: &PlaybackState) -> Decision {
    if !sample.enabled || segments.is_empty() {
        return Decision {
            state: PlaybackState::idle_at(sample.time),
            trigger: None,
            enforce_pause: false,
            display: None,
        };
    }

    let playing_during_narration = previous.narration_active && !sample.surface_paused;

    let Some(index) = segments.find_containing(sample.time) else {
        if previous.active_range.is_some() {
            tracing::debug!("Left range at {:.2}s", sample.time);
        }
        return Decision {
            state: PlaybackState::idle_at(sample.time),
            trigger: None,
            enforce_pause: false,
            display: None,
        };
    };

    let mut state = if previous.active_range == Some(index) {
        PlaybackState {
            current_time: sample.time,
            ..*previous
        }
    } else {
        tracing::debug!("Entered range {} at {:.2}s", index, sample.time);
        PlaybackState {
            current_time: sample.time,
            active_range: Some(index),
            triggered_for_active_range: false,
            narration_active: false,
        }
    };

    let trigger = if !state.triggered_for_active_range && !state.narration_active {
        state.triggered_for_active_range = true;
        state.narration_active = true;
        Some(index)
    } else {
        None
    };

    Decision {
        enforce_pause: playing_during_narration && trigger.is_none() && state.narration_active,
        state,
        trigger,
        display: Some(index),
    }
}
