//! Speech Synthesis
//!
//! The speech engine is a single process-wide resource: only one utterance is
//! in flight at a time, and starting a new one implicitly interrupts whatever
//! was speaking. Callers hold it as a [`SharedSpeech`] handle.

pub mod simulated;
#[cfg(feature = "system-tts")]
pub mod system;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

pub use simulated::{SimulatedSpeech, SpeechTiming};
#[cfg(feature = "system-tts")]
pub use system::SystemSpeech;

/// Identifier of a single utterance, unique per engine.
pub type UtteranceId = u64;

/// Shared handle to the process-wide speech engine.
pub type SharedSpeech = Arc<dyn SpeechEngine>;

/// Errors that can occur during speech synthesis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    #[error("Speech synthesis not available: {0}")]
    Unavailable(String),

    #[error("Nothing to speak")]
    EmptyText,

    #[error("Speech synthesis failed: {0}")]
    Failed(String),
}

/// Why an utterance ended without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechErrorKind {
    /// A newer utterance replaced this one
    Interrupted,
    /// Explicitly cancelled
    Canceled,
    /// Genuine synthesis failure
    Other,
}

/// Speech lifecycle notifications
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    /// Utterance started
    Started { utterance: UtteranceId },
    /// Utterance finished naturally
    Ended { utterance: UtteranceId },
    /// Utterance ended early
    Failed {
        utterance: UtteranceId,
        kind: SpeechErrorKind,
        message: String,
    },
}

impl SpeechEvent {
    /// Utterance this event refers to.
    pub fn utterance(&self) -> UtteranceId {
        match self {
            SpeechEvent::Started { utterance }
            | SpeechEvent::Ended { utterance }
            | SpeechEvent::Failed { utterance, .. } => *utterance,
        }
    }
}

/// Voice options applied to each utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    /// Speech rate multiplier (0.5 - 2.0, 1.0 is normal)
    pub rate: f32,
    /// Pitch (0.0 - 2.0, 1.0 is normal)
    pub pitch: f32,
    /// Volume (0.0 - 1.0)
    pub volume: f32,
    /// Preferred voice name, used when the engine offers it
    pub voice: Option<String>,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

impl SpeechOptions {
    /// Options with every value clamped into its supported range.
    pub fn clamped(&self) -> Self {
        Self {
            rate: self.rate.clamp(0.5, 2.0),
            pitch: self.pitch.clamp(0.0, 2.0),
            volume: self.volume.clamp(0.0, 1.0),
            voice: self.voice.clone(),
        }
    }
}

/// Speech synthesis capability.
pub trait SpeechEngine: Send + Sync {
    /// Start speaking `text`, replacing any utterance in flight.
    ///
    /// Completion is reported through [`SpeechEngine::subscribe_events`].
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<UtteranceId, SpeechError>;

    /// Pause the current utterance
    fn pause(&self);

    /// Resume a paused utterance
    fn resume(&self);

    /// Cancel the current utterance
    fn cancel(&self);

    /// Check if an utterance is in flight
    fn is_speaking(&self) -> bool;

    /// Subscribe to speech events
    fn subscribe_events(&self) -> broadcast::Receiver<SpeechEvent>;
}

/// Collapse runs of whitespace so the synthesizer reads text evenly.
pub fn prepare_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
