//! Synchronization engine core.
//!
//! Single-threaded state machine fed by time samples, seeks, speech events and
//! user commands. Each input is applied in full before the next one, so the
//! order of effects is the order of arrival.

use super::narration::{NarrationController, NarrationOutcome, NarrationPhase};
use super::state::PlaybackState;
use super::tracker::{track, Sample};
use crate::descriptions::{DescriptionSegment, SegmentList};
use crate::playback::{ClockEvent, PlaybackClock};
use crate::speech::{SharedSpeech, SpeechEvent, SpeechOptions};
use crate::storage::config::SyncSettings;
use tokio::sync::{broadcast, mpsc};

/// Callback invoked once per completed or skipped narration with its range index.
pub type CompletionCallback = Box<dyn FnMut(usize) + Send>;

/// Keeps narration in step with playback
pub struct SyncEngine {
    clock: Box<dyn PlaybackClock>,
    segments: SegmentList,
    state: PlaybackState,
    controller: NarrationController,
    enabled: bool,
    on_complete: Option<CompletionCallback>,
    displayed: Option<usize>,
    last_narrated: Option<usize>,
}

impl SyncEngine {
    /// Create an engine over a mounted clock and the shared speech engine
    pub fn new(
        clock: Box<dyn PlaybackClock>,
        segments: SegmentList,
        speech: SharedSpeech,
        options: SpeechOptions,
        settings: &SyncSettings,
    ) -> Self {
        Self {
            clock,
            segments,
            state: PlaybackState::default(),
            controller: NarrationController::new(speech, options, settings.control_retry_limit),
            enabled: settings.descriptions_enabled,
            on_complete: None,
            displayed: None,
            last_narrated: None,
        }
    }

    /// Register the upward narration-complete callback
    pub fn set_on_narration_complete(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Current tracking state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Segments being tracked
    pub fn segments(&self) -> &SegmentList {
        &self.segments
    }

    /// Whether narration is switched on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Narration controller
    pub fn controller(&self) -> &NarrationController {
        &self.controller
    }

    /// Playback clock
    pub fn clock(&self) -> &dyn PlaybackClock {
        self.clock.as_ref()
    }

    /// Index of the range whose description is currently shown
    pub fn displayed_index(&self) -> Option<usize> {
        self.displayed
    }

    /// Segment whose description is currently shown
    pub fn displayed_segment(&self) -> Option<&DescriptionSegment> {
        self.displayed.and_then(|i| self.segments.get(i))
    }

    /// Index of the most recently completed narration
    pub fn last_narrated(&self) -> Option<usize> {
        self.last_narrated
    }

    /// Start the clock's event stream. Must be called inside a tokio runtime.
    pub fn subscribe_clock(&mut self) -> mpsc::UnboundedReceiver<ClockEvent> {
        self.clock.subscribe()
    }

    /// Subscribe to the speech engine's events
    pub fn subscribe_speech(&self) -> broadcast::Receiver<SpeechEvent> {
        self.controller.speech().subscribe_events()
    }

    /// Apply a clock event
    pub fn on_clock_event(&mut self, event: ClockEvent) {
        match event {
            ClockEvent::Sample(time) => self.on_sample(time),
            ClockEvent::Seeked(time) => self.on_seek(time),
        }
    }

    /// Evaluate one time sample.
    pub fn on_sample(&mut self, time: f64) {
        let sample = Sample {
            time,
            surface_paused: self.clock.is_paused(),
            enabled: self.enabled,
        };
        let decision = track(sample, &self.segments, &self.state);

        // Range exit or fresh entry ends the outstanding cycle before anything
        // new starts.
        if self.controller.is_busy()
            && (decision.trigger.is_some() || !decision.state.narration_active)
        {
            self.controller.interrupt();
        }

        self.state = decision.state;
        self.displayed = decision.display;

        let outcome = match decision.trigger {
            Some(index) => match self.segments.get(index) {
                Some(segment) => self.controller.begin(index, &segment.text, self.clock.as_ref()),
                None => NarrationOutcome::Unchanged,
            },
            None => self
                .controller
                .on_sample(self.clock.as_ref(), decision.enforce_pause),
        };
        self.apply(outcome);
    }

    /// Playback jumped; forget everything about the previous position.
    pub fn on_seek(&mut self, time: f64) {
        tracing::debug!("Seek to {:.2}s, resetting tracking", time);
        self.controller.interrupt();
        self.state = PlaybackState::idle_at(time);
        self.displayed = None;
    }

    /// Apply a speech engine event
    pub fn on_speech_event(&mut self, event: &SpeechEvent) {
        let outcome = self
            .controller
            .on_speech_event(event, self.clock.as_ref(), self.enabled);
        self.apply(outcome);
    }

    /// Switch narration on or off.
    ///
    /// Switching off cancels speech immediately and leaves playback paused.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        tracing::info!("Descriptions {}", if enabled { "enabled" } else { "disabled" });

        if !enabled {
            self.controller.interrupt();
            self.state = PlaybackState::idle_at(self.state.current_time);
            self.displayed = None;
        }
    }

    /// Flip the narration switch
    pub fn toggle_enabled(&mut self) {
        self.set_enabled(!self.enabled);
    }

    /// Stop the current narration; control returns to the user.
    ///
    /// Completion is reported only if speech had started; a narration still
    /// waiting for the surface to pause is dropped silently.
    pub fn skip(&mut self) {
        let speaking = matches!(self.controller.phase(), NarrationPhase::Speaking { .. });
        if let Some(index) = self.controller.interrupt() {
            tracing::info!("Narration for range {} skipped", index);
            self.state = self.state.narration_released();
            if speaking {
                self.complete(index);
            }
        }
    }

    /// Replace the segment list wholesale
    pub fn reload_segments(&mut self, segments: SegmentList) {
        tracing::info!("Reloading {} description segments", segments.len());
        self.controller.interrupt();
        self.segments = segments;
        self.state = PlaybackState::idle_at(self.state.current_time);
        self.displayed = None;
    }

    /// Change voice options; the utterance in flight keeps its voice.
    pub fn set_speech_options(&mut self, options: SpeechOptions) {
        tracing::debug!("Speech options changed: {:?}", options);
        self.controller.set_options(options);
    }

    /// Pause the current utterance
    pub fn pause_speech(&self) {
        self.controller.pause_speech();
    }

    /// Resume the current utterance
    pub fn resume_speech(&self) {
        self.controller.resume_speech();
    }

    /// Cancel narration and stop the clock
    pub fn shutdown(&mut self) {
        self.controller.interrupt();
        self.clock.stop();
        self.state = PlaybackState::idle_at(self.state.current_time);
    }

    fn apply(&mut self, outcome: NarrationOutcome) {
        match outcome {
            NarrationOutcome::Completed { index } => {
                self.state = self.state.narration_released();
                self.complete(index);
            }
            NarrationOutcome::Unchanged
            | NarrationOutcome::Pending { .. }
            | NarrationOutcome::Started { .. }
            | NarrationOutcome::Refused { .. } => {}
        }
    }

    fn complete(&mut self, index: usize) {
        self.last_narrated = Some(index);
        if let Some(callback) = self.on_complete.as_mut() {
            callback(index);
        }
    }
}
