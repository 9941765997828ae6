//! Simulated speech engine.
//!
//! Models an utterance's duration from its length instead of producing audio.
//! Used by the preview binary when no system voice is available, and by tests,
//! which can also drive utterance completion by hand.

use super::{
    prepare_text, SpeechEngine, SpeechError, SpeechErrorKind, SpeechEvent, SpeechOptions,
    UtteranceId,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long simulated utterances take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeechTiming {
    /// Utterances only end when the caller says so
    Manual,
    /// Duration proportional to text length, scaled by the speech rate
    PerChar {
        millis_per_char: u64,
        max_duration: Duration,
    },
}

impl Default for SpeechTiming {
    fn default() -> Self {
        SpeechTiming::PerChar {
            millis_per_char: 50,
            max_duration: Duration::from_secs(10),
        }
    }
}

impl SpeechTiming {
    fn duration_for(&self, text: &str, rate: f32) -> Option<Duration> {
        match *self {
            SpeechTiming::Manual => None,
            SpeechTiming::PerChar {
                millis_per_char,
                max_duration,
            } => {
                let base = Duration::from_millis(text.chars().count() as u64 * millis_per_char);
                Some(base.div_f32(rate.max(0.1)).min(max_duration))
            }
        }
    }
}

#[derive(Debug)]
struct Utterance {
    id: UtteranceId,
    /// Time left to speak; `None` for manual timing
    remaining: Option<Duration>,
    resumed_at: Instant,
    paused: bool,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: UtteranceId,
    current: Option<Utterance>,
    spoken: Vec<String>,
    last_options: Option<SpeechOptions>,
}

/// Speech engine that simulates utterance timing
pub struct SimulatedSpeech {
    timing: SpeechTiming,
    inner: Arc<Mutex<Inner>>,
    event_tx: broadcast::Sender<SpeechEvent>,
}

impl Default for SimulatedSpeech {
    fn default() -> Self {
        Self::new(SpeechTiming::default())
    }
}

impl SimulatedSpeech {
    /// Create a simulated engine with the given timing model
    pub fn new(timing: SpeechTiming) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            timing,
            inner: Arc::new(Mutex::new(Inner::default())),
            event_tx,
        }
    }

    /// Engine whose utterances complete only through [`SimulatedSpeech::finish`]
    pub fn manual() -> Self {
        Self::new(SpeechTiming::Manual)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Texts passed to `speak`, in order
    pub fn spoken(&self) -> Vec<String> {
        self.lock().spoken.clone()
    }

    /// Options the most recent utterance was spoken with
    pub fn last_options(&self) -> Option<SpeechOptions> {
        self.lock().last_options.clone()
    }

    /// Utterance currently in flight
    pub fn current_utterance(&self) -> Option<UtteranceId> {
        self.lock().current.as_ref().map(|u| u.id)
    }

    /// Whether the current utterance is paused
    pub fn is_paused(&self) -> bool {
        self.lock().current.as_ref().map(|u| u.paused).unwrap_or(false)
    }

    /// Complete the current utterance naturally
    pub fn finish(&self) -> Option<UtteranceId> {
        let mut inner = self.lock();
        let utterance = inner.current.take()?;
        if let Some(task) = utterance.task {
            task.abort();
        }
        let _ = self.event_tx.send(SpeechEvent::Ended {
            utterance: utterance.id,
        });
        Some(utterance.id)
    }

    /// End the current utterance with an error
    pub fn fail(&self, kind: SpeechErrorKind, message: &str) -> Option<UtteranceId> {
        let mut inner = self.lock();
        let utterance = inner.current.take()?;
        if let Some(task) = utterance.task {
            task.abort();
        }
        let _ = self.event_tx.send(SpeechEvent::Failed {
            utterance: utterance.id,
            kind,
            message: message.to_string(),
        });
        Some(utterance.id)
    }

    fn schedule(&self, id: UtteranceId, after: Duration) -> Result<JoinHandle<()>, SpeechError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?;
        let inner = Arc::clone(&self.inner);
        let event_tx = self.event_tx.clone();

        Ok(runtime.spawn(async move {
            tokio::time::sleep(after).await;

            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.current.as_ref().map(|u| u.id) == Some(id) {
                inner.current = None;
                let _ = event_tx.send(SpeechEvent::Ended { utterance: id });
            }
        }))
    }
}

impl SpeechEngine for SimulatedSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<UtteranceId, SpeechError> {
        let text = prepare_text(text);
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let options = options.clamped();
        let remaining = self.timing.duration_for(&text, options.rate);

        let mut inner = self.lock();

        if let Some(previous) = inner.current.take() {
            if let Some(task) = previous.task {
                task.abort();
            }
            let _ = self.event_tx.send(SpeechEvent::Failed {
                utterance: previous.id,
                kind: SpeechErrorKind::Interrupted,
                message: "interrupted".to_string(),
            });
        }

        inner.next_id += 1;
        let id = inner.next_id;

        // The timer task takes the lock before reporting, so it cannot observe
        // the utterance before it is recorded below.
        let task = match remaining {
            Some(duration) => Some(self.schedule(id, duration)?),
            None => None,
        };

        tracing::debug!("Simulated speech {}: {}", id, text);

        inner.spoken.push(text);
        inner.last_options = Some(options);
        inner.current = Some(Utterance {
            id,
            remaining,
            resumed_at: Instant::now(),
            paused: false,
            task,
        });
        let _ = self.event_tx.send(SpeechEvent::Started { utterance: id });

        Ok(id)
    }

    fn pause(&self) {
        let mut inner = self.lock();
        if let Some(utterance) = inner.current.as_mut() {
            if utterance.paused {
                return;
            }
            if let Some(task) = utterance.task.take() {
                task.abort();
            }
            let elapsed = utterance.resumed_at.elapsed();
            utterance.remaining = utterance.remaining.map(|r| r.saturating_sub(elapsed));
            utterance.paused = true;
        }
    }

    fn resume(&self) {
        let (id, remaining) = {
            let mut inner = self.lock();
            match inner.current.as_mut() {
                Some(utterance) if utterance.paused => {
                    utterance.paused = false;
                    utterance.resumed_at = Instant::now();
                    (utterance.id, utterance.remaining)
                }
                _ => return,
            }
        };

        if let Some(remaining) = remaining {
            match self.schedule(id, remaining) {
                Ok(task) => {
                    if let Some(utterance) = self.lock().current.as_mut().filter(|u| u.id == id) {
                        utterance.task = Some(task);
                    } else {
                        task.abort();
                    }
                }
                Err(e) => tracing::warn!("Could not resume simulated speech: {}", e),
            }
        }
    }

    fn cancel(&self) {
        let mut inner = self.lock();
        if let Some(utterance) = inner.current.take() {
            if let Some(task) = utterance.task {
                task.abort();
            }
            let _ = self.event_tx.send(SpeechEvent::Failed {
                utterance: utterance.id,
                kind: SpeechErrorKind::Canceled,
                message: "canceled".to_string(),
            });
        }
    }

    fn is_speaking(&self) -> bool {
        self.lock().current.is_some()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SpeechEvent> {
        self.event_tx.subscribe()
    }
}
