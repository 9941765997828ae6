//! Playback tracking state.

/// Snapshot of what the engine knows about playback, replaced on every update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    /// Last observed time in seconds
    pub current_time: f64,
    /// Index of the range containing `current_time`
    pub active_range: Option<usize>,
    /// Narration has already started for this entry into `active_range`
    pub triggered_for_active_range: bool,
    /// Narration currently owns playback
    pub narration_active: bool,
}

impl PlaybackState {
    /// State with no active range, remembering only the time.
    pub fn idle_at(current_time: f64) -> Self {
        Self {
            current_time,
            ..Self::default()
        }
    }

    /// Same state with narration released; the dwell memory is kept.
    pub fn narration_released(self) -> Self {
        Self {
            narration_active: false,
            ..self
        }
    }
}
