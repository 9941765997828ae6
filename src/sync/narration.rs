//! Narration Controller
//!
//! Owns the pause, speak, resume cycle for one segment at a time. The speech
//! engine is injected as a shared handle; the controller never starts a second
//! utterance while one is outstanding.

use crate::playback::PlaybackClock;
use crate::speech::{SharedSpeech, SpeechErrorKind, SpeechEvent, SpeechOptions, UtteranceId};

/// Where the controller is in the narration cycle
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationPhase {
    /// Nothing in flight
    Idle,
    /// Waiting for the surface to accept a pause
    Pausing {
        index: usize,
        text: String,
        failures: u32,
    },
    /// Utterance in flight
    Speaking {
        index: usize,
        utterance: UtteranceId,
    },
}

/// What a controller step did, for the engine to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationOutcome {
    /// Nothing changed
    Unchanged,
    /// Still waiting for the surface to pause
    Pending { index: usize },
    /// Speech started
    Started { index: usize, utterance: UtteranceId },
    /// Narration for `index` finished; playback resumed unless disabled
    Completed { index: usize },
    /// A trigger arrived while another narration was outstanding
    Refused { index: usize },
}

/// Drives the pause, speak, resume cycle
pub struct NarrationController {
    speech: SharedSpeech,
    options: SpeechOptions,
    retry_limit: u32,
    phase: NarrationPhase,
    /// Failed resume attempts still to be retried
    pending_resume: Option<u32>,
}

impl NarrationController {
    /// Create a controller over the shared speech engine.
    ///
    /// A rejected pause is retried on every sample until the range is left.
    /// `retry_limit` is how many extra attempts a rejected play command gets,
    /// one per time sample.
    pub fn new(speech: SharedSpeech, options: SpeechOptions, retry_limit: u32) -> Self {
        Self {
            speech,
            options,
            retry_limit,
            phase: NarrationPhase::Idle,
            pending_resume: None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> &NarrationPhase {
        &self.phase
    }

    /// Whether a narration is outstanding
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, NarrationPhase::Idle)
    }

    /// Index of the segment being narrated
    pub fn active_index(&self) -> Option<usize> {
        match self.phase {
            NarrationPhase::Idle => None,
            NarrationPhase::Pausing { index, .. } | NarrationPhase::Speaking { index, .. } => {
                Some(index)
            }
        }
    }

    /// Whether a failed resume is waiting to be retried
    pub fn resume_pending(&self) -> bool {
        self.pending_resume.is_some()
    }

    /// Speech engine this controller narrates through
    pub fn speech(&self) -> &SharedSpeech {
        &self.speech
    }

    /// Voice options for new utterances
    pub fn options(&self) -> &SpeechOptions {
        &self.options
    }

    /// Replace the voice options for later utterances
    pub fn set_options(&mut self, options: SpeechOptions) {
        self.options = options.clamped();
    }

    /// Start narrating segment `index`: pause playback, then speak `text`.
    pub fn begin(&mut self, index: usize, text: &str, clock: &dyn PlaybackClock) -> NarrationOutcome {
        if let Some(active) = self.active_index() {
            tracing::warn!(
                "Ignoring narration trigger for range {} while range {} is outstanding",
                index,
                active
            );
            return NarrationOutcome::Refused { index };
        }

        self.pending_resume = None;

        match clock.pause() {
            Ok(()) => self.speak(index, text.to_string(), clock),
            Err(e) => {
                tracing::warn!("Pause rejected before narrating range {}: {}", index, e);
                self.phase = NarrationPhase::Pausing {
                    index,
                    text: text.to_string(),
                    failures: 1,
                };
                NarrationOutcome::Pending { index }
            }
        }
    }

    /// Per-sample upkeep: retry rejected commands and hold the pause.
    pub fn on_sample(&mut self, clock: &dyn PlaybackClock, enforce_pause: bool) -> NarrationOutcome {
        match &mut self.phase {
            NarrationPhase::Pausing {
                index,
                text,
                failures,
            } => {
                let index = *index;
                match clock.pause() {
                    Ok(()) => {
                        let text = std::mem::take(text);
                        self.speak(index, text, clock)
                    }
                    Err(e) => {
                        *failures += 1;
                        if *failures == self.retry_limit + 1 {
                            tracing::warn!(
                                "Playback still rejects pause for range {}, retrying while in range: {}",
                                index,
                                e
                            );
                        } else {
                            tracing::debug!("Pause retry {} for range {} failed: {}", failures, index, e);
                        }
                        NarrationOutcome::Pending { index }
                    }
                }
            }
            NarrationPhase::Speaking { .. } => {
                if enforce_pause {
                    tracing::debug!("Playback resumed during narration, pausing again");
                    if let Err(e) = clock.pause() {
                        tracing::warn!("Failed to hold pause during narration: {}", e);
                    }
                }
                NarrationOutcome::Unchanged
            }
            NarrationPhase::Idle => {
                self.retry_resume(clock);
                NarrationOutcome::Unchanged
            }
        }
    }

    /// React to a speech engine event.
    ///
    /// `resume` is false when narration was switched off in the meantime, in
    /// which case playback is left paused for the user.
    pub fn on_speech_event(
        &mut self,
        event: &SpeechEvent,
        clock: &dyn PlaybackClock,
        resume: bool,
    ) -> NarrationOutcome {
        let (index, utterance) = match self.phase {
            NarrationPhase::Speaking { index, utterance } => (index, utterance),
            _ => return NarrationOutcome::Unchanged,
        };
        if event.utterance() != utterance {
            return NarrationOutcome::Unchanged;
        }

        match event {
            SpeechEvent::Started { .. } => NarrationOutcome::Unchanged,
            SpeechEvent::Ended { .. } => self.finish(index, clock, resume),
            SpeechEvent::Failed {
                kind: SpeechErrorKind::Interrupted,
                ..
            } => {
                tracing::debug!("Utterance {} superseded", utterance);
                NarrationOutcome::Unchanged
            }
            SpeechEvent::Failed { kind, message, .. } => {
                tracing::warn!("Narration for range {} failed ({:?}): {}", index, kind, message);
                self.finish(index, clock, resume)
            }
        }
    }

    /// Cancel any outstanding narration without resuming playback.
    ///
    /// Returns the index that was being narrated.
    pub fn interrupt(&mut self) -> Option<usize> {
        self.pending_resume = None;
        let index = self.active_index()?;

        if let NarrationPhase::Speaking { utterance, .. } = self.phase {
            tracing::debug!("Cancelling utterance {}", utterance);
            self.speech.cancel();
        }
        self.phase = NarrationPhase::Idle;
        tracing::info!("Narration for range {} interrupted", index);
        Some(index)
    }

    /// Pause the current utterance without changing narration state
    pub fn pause_speech(&self) {
        if matches!(self.phase, NarrationPhase::Speaking { .. }) {
            self.speech.pause();
        }
    }

    /// Resume a paused utterance
    pub fn resume_speech(&self) {
        if matches!(self.phase, NarrationPhase::Speaking { .. }) {
            self.speech.resume();
        }
    }

    fn speak(&mut self, index: usize, text: String, clock: &dyn PlaybackClock) -> NarrationOutcome {
        match self.speech.speak(&text, &self.options) {
            Ok(utterance) => {
                tracing::info!("Narrating range {}", index);
                tracing::debug!("Utterance {}: {}", utterance, text);
                self.phase = NarrationPhase::Speaking { index, utterance };
                NarrationOutcome::Started { index, utterance }
            }
            Err(e) => {
                tracing::warn!("Speech for range {} failed to start: {}", index, e);
                self.finish(index, clock, true)
            }
        }
    }

    fn finish(&mut self, index: usize, clock: &dyn PlaybackClock, resume: bool) -> NarrationOutcome {
        self.phase = NarrationPhase::Idle;
        tracing::info!("Narration for range {} complete", index);

        if resume {
            if let Err(e) = clock.play() {
                tracing::warn!("Failed to resume playback: {}", e);
                self.pending_resume = Some(1);
            }
        } else {
            tracing::debug!("Narration disabled, leaving playback paused");
        }

        NarrationOutcome::Completed { index }
    }

    fn retry_resume(&mut self, clock: &dyn PlaybackClock) {
        let Some(failures) = self.pending_resume else {
            return;
        };

        if !clock.is_paused() {
            self.pending_resume = None;
            return;
        }

        match clock.play() {
            Ok(()) => {
                tracing::debug!("Playback resumed on retry");
                self.pending_resume = None;
            }
            Err(e) if failures >= self.retry_limit => {
                tracing::warn!("Giving up resuming playback: {}", e);
                self.pending_resume = None;
            }
            Err(_) => self.pending_resume = Some(failures + 1),
        }
    }
}
