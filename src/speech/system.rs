//! Platform speech engine using the tts crate.
//!
//! The platform synthesizer is owned by a dedicated worker thread; the engine
//! handle only sends commands to it. Completion comes from the backend's
//! utterance callbacks where offered. Otherwise the worker polls the
//! synthesizer's speaking state, and as a last resort estimates the duration
//! from the text length.

use super::{
    prepare_text, SpeechEngine, SpeechError, SpeechErrorKind, SpeechEvent, SpeechOptions,
    UtteranceId,
};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// How often the worker checks whether the synthesizer is still speaking.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet polls tolerated before an utterance is considered to have started.
const START_GRACE_POLLS: u32 = 10;

/// Duration estimate per character when the backend reports nothing.
const MILLIS_PER_CHAR: u64 = 70;

enum Command {
    Speak {
        id: UtteranceId,
        text: String,
        options: SpeechOptions,
    },
    Cancel,
    Shutdown,
    BackendBegan(tts::UtteranceId),
    BackendEnded(tts::UtteranceId),
}

/// Speech engine backed by the operating system's synthesizer
pub struct SystemSpeech {
    commands: Sender<Command>,
    next_id: AtomicU64,
    speaking: Arc<AtomicBool>,
    event_tx: broadcast::Sender<SpeechEvent>,
}

impl SystemSpeech {
    /// Start the synthesizer worker.
    pub fn new() -> Result<Self, SpeechError> {
        let (commands, rx) = unbounded();
        let (ready_tx, ready_rx) = crossbeam::channel::bounded(1);
        let (event_tx, _) = broadcast::channel(64);
        let speaking = Arc::new(AtomicBool::new(false));

        let worker_commands = commands.clone();
        let worker_events = event_tx.clone();
        let worker_speaking = Arc::clone(&speaking);
        std::thread::Builder::new()
            .name("vidscribe-tts".to_string())
            .spawn(move || match tts::Tts::default() {
                Ok(tts) => {
                    let callbacks = register_callbacks(&tts, &worker_commands);
                    let _ = ready_tx.send(Ok(()));
                    run_worker(tts, callbacks, rx, worker_events, worker_speaking);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(SpeechError::Unavailable(e.to_string())));
                }
            })
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|e| SpeechError::Unavailable(e.to_string()))??;

        tracing::info!("System speech engine ready");

        Ok(Self {
            commands,
            next_id: AtomicU64::new(0),
            speaking,
            event_tx,
        })
    }
}

impl Drop for SystemSpeech {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

impl SpeechEngine for SystemSpeech {
    fn speak(&self, text: &str, options: &SpeechOptions) -> Result<UtteranceId, SpeechError> {
        let text = prepare_text(text);
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.speaking.store(true, Ordering::SeqCst);
        self.commands
            .send(Command::Speak {
                id,
                text,
                options: options.clamped(),
            })
            .map_err(|_| SpeechError::Unavailable("speech worker stopped".to_string()))?;

        Ok(id)
    }

    fn pause(&self) {
        tracing::debug!("System speech backend cannot pause; ignoring");
    }

    fn resume(&self) {}

    fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SpeechEvent> {
        self.event_tx.subscribe()
    }
}

/// Route the backend's utterance callbacks into the worker's command queue.
///
/// Returns whether completion can be taken from callbacks.
fn register_callbacks(tts: &tts::Tts, commands: &Sender<Command>) -> bool {
    if !tts.supported_features().utterance_callbacks {
        tracing::debug!("Speech backend has no utterance callbacks; polling instead");
        return false;
    }

    let began = commands.clone();
    let ended = commands.clone();
    let registered = tts
        .on_utterance_begin(Some(Box::new(move |id| {
            let _ = began.send(Command::BackendBegan(id));
        })))
        .and_then(|()| {
            tts.on_utterance_end(Some(Box::new(move |id| {
                let _ = ended.send(Command::BackendEnded(id));
            })))
        });

    match registered {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Could not register speech callbacks: {}", e);
            false
        }
    }
}

/// Completion tracking for the utterance in flight.
///
/// Generic over the backend's utterance id so the decision logic does not
/// depend on a live synthesizer.
#[derive(Debug)]
struct UtteranceWatch<B> {
    id: UtteranceId,
    /// Backend id, when the backend reports completion through callbacks
    backend: Option<B>,
    /// The backend has been seen speaking this utterance
    heard: bool,
    quiet_polls: u32,
    /// Estimated end for backends that report nothing
    deadline: Instant,
}

impl<B: PartialEq> UtteranceWatch<B> {
    fn new(id: UtteranceId, backend: Option<B>, text: &str, rate: f32, now: Instant) -> Self {
        let estimate = Duration::from_millis(text.chars().count() as u64 * MILLIS_PER_CHAR)
            .div_f32(rate.max(0.1));
        Self {
            id,
            backend,
            heard: false,
            quiet_polls: 0,
            deadline: now + estimate,
        }
    }

    /// Whether completion arrives through callbacks
    fn by_callback(&self) -> bool {
        self.backend.is_some()
    }

    fn matches(&self, backend: &B) -> bool {
        self.backend.as_ref() == Some(backend)
    }

    /// Evaluate one poll. `speaking` is `None` when the backend cannot tell.
    ///
    /// Returns true once the utterance has finished.
    fn poll(&mut self, speaking: Option<bool>, now: Instant) -> bool {
        if self.by_callback() {
            return false;
        }

        match speaking {
            Some(true) => {
                self.heard = true;
                false
            }
            // Backends report speaking asynchronously; an early quiet reading
            // only means the utterance has not started yet.
            Some(false) if !self.heard => {
                self.quiet_polls += 1;
                self.quiet_polls >= START_GRACE_POLLS
            }
            Some(false) => true,
            None => now >= self.deadline,
        }
    }
}

fn run_worker(
    mut tts: tts::Tts,
    callbacks: bool,
    commands: Receiver<Command>,
    events: broadcast::Sender<SpeechEvent>,
    speaking: Arc<AtomicBool>,
) {
    let features = tts.supported_features();
    let mut current: Option<UtteranceWatch<tts::UtteranceId>> = None;

    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(Command::Speak { id, text, options }) => {
                if let Some(previous) = current.take() {
                    let _ = events.send(SpeechEvent::Failed {
                        utterance: previous.id,
                        kind: SpeechErrorKind::Interrupted,
                        message: "interrupted".to_string(),
                    });
                }

                apply_options(&mut tts, &features, &options);

                match tts.speak(text.as_str(), true) {
                    Ok(backend) => {
                        let backend = backend.filter(|_| callbacks);
                        current = Some(UtteranceWatch::new(
                            id,
                            backend,
                            &text,
                            options.rate,
                            Instant::now(),
                        ));
                        let _ = events.send(SpeechEvent::Started { utterance: id });
                    }
                    Err(e) => {
                        speaking.store(false, Ordering::SeqCst);
                        let _ = events.send(SpeechEvent::Failed {
                            utterance: id,
                            kind: SpeechErrorKind::Other,
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(Command::Cancel) => {
                if features.stop {
                    if let Err(e) = tts.stop() {
                        tracing::warn!("Failed to stop speech: {}", e);
                    }
                }
                if let Some(previous) = current.take() {
                    let _ = events.send(SpeechEvent::Failed {
                        utterance: previous.id,
                        kind: SpeechErrorKind::Canceled,
                        message: "canceled".to_string(),
                    });
                }
                speaking.store(false, Ordering::SeqCst);
            }
            Ok(Command::BackendBegan(backend)) => {
                if current.as_ref().is_some_and(|w| w.matches(&backend)) {
                    tracing::debug!("Speech backend started utterance");
                }
            }
            Ok(Command::BackendEnded(backend)) => {
                if current.as_ref().is_some_and(|w| w.matches(&backend)) {
                    if let Some(watch) = current.take() {
                        finish(watch.id, &events, &speaking);
                    }
                }
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                if features.stop {
                    let _ = tts.stop();
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let done = match current.as_mut() {
            Some(watch) if !watch.by_callback() => {
                let reading = if features.is_speaking {
                    tts.is_speaking().ok()
                } else {
                    None
                };
                watch.poll(reading, Instant::now())
            }
            _ => false,
        };
        if done {
            if let Some(watch) = current.take() {
                finish(watch.id, &events, &speaking);
            }
        }
    }

    tracing::debug!("System speech worker stopped");
}

fn finish(id: UtteranceId, events: &broadcast::Sender<SpeechEvent>, speaking: &AtomicBool) {
    speaking.store(false, Ordering::SeqCst);
    let _ = events.send(SpeechEvent::Ended { utterance: id });
}

fn apply_options(tts: &mut tts::Tts, features: &tts::Features, options: &SpeechOptions) {
    if features.rate {
        let rate = scale_around_normal(
            options.rate,
            0.5,
            2.0,
            (tts.min_rate(), tts.normal_rate(), tts.max_rate()),
        );
        let _ = tts.set_rate(rate);
    }
    if features.pitch {
        let pitch = scale_around_normal(
            options.pitch,
            0.0,
            2.0,
            (tts.min_pitch(), tts.normal_pitch(), tts.max_pitch()),
        );
        let _ = tts.set_pitch(pitch);
    }
    if features.volume {
        let (min, max) = (tts.min_volume(), tts.max_volume());
        let _ = tts.set_volume(min + (max - min) * options.volume);
    }
    if let (true, Some(name)) = (features.voice, options.voice.as_deref()) {
        match tts.voices() {
            Ok(voices) => {
                if let Some(voice) = voices.iter().find(|v| v.name() == name) {
                    let _ = tts.set_voice(voice);
                }
            }
            Err(e) => tracing::debug!("Could not list voices: {}", e),
        }
    }
}

/// Map a value from `[low, high]` with 1.0 as normal onto a backend range.
fn scale_around_normal(value: f32, low: f32, high: f32, backend: (f32, f32, f32)) -> f32 {
    let (min, normal, max) = backend;
    if value >= 1.0 {
        normal + (value - 1.0) / (high - 1.0) * (max - normal)
    } else {
        normal - (1.0 - value) / (1.0 - low) * (normal - min)
    }
}
