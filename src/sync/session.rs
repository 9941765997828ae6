//! Async session driving one [`SyncEngine`] for a mounted video.
//!
//! The session multiplexes clock events, speech events and host commands onto
//! the engine from a single task, which keeps every state update sequential.

use super::engine::SyncEngine;
use super::SyncError;
use crate::descriptions::SegmentList;
use crate::playback::{mount_clock, ClockEvent, SurfaceProvider, VideoSource};
use crate::speech::{SharedSpeech, SpeechEvent, SpeechOptions};
use crate::storage::config::{NarrationSettings, SyncSettings};
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;
use uuid::Uuid;

/// Commands a host page can send to a running session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Switch narration on or off
    SetEnabled(bool),
    /// Flip narration on or off
    ToggleEnabled,
    /// Stop the current narration
    Skip,
    /// Replace the description segments
    ReloadSegments(SegmentList),
    /// Replace the voice options for later utterances
    SetSpeechOptions(SpeechOptions),
    /// Pause the current utterance
    PauseSpeech,
    /// Resume the current utterance
    ResumeSpeech,
    /// End the session
    Shutdown,
}

/// Cloneable handle for controlling a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Send a command to the session
    pub fn send(&self, command: SessionCommand) -> Result<(), SyncError> {
        self.commands
            .send(command)
            .map_err(|_| SyncError::SessionClosed)
    }

    /// Switch narration on or off
    pub fn set_enabled(&self, enabled: bool) -> Result<(), SyncError> {
        self.send(SessionCommand::SetEnabled(enabled))
    }

    /// Flip narration on or off
    pub fn toggle_enabled(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::ToggleEnabled)
    }

    /// Stop the current narration
    pub fn skip(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::Skip)
    }

    /// Replace the description segments
    pub fn reload_segments(&self, segments: SegmentList) -> Result<(), SyncError> {
        self.send(SessionCommand::ReloadSegments(segments))
    }

    /// Replace the voice options for later utterances
    pub fn set_speech_options(&self, options: SpeechOptions) -> Result<(), SyncError> {
        self.send(SessionCommand::SetSpeechOptions(options))
    }

    /// Pause the current utterance
    pub fn pause_speech(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::PauseSpeech)
    }

    /// Resume the current utterance
    pub fn resume_speech(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::ResumeSpeech)
    }

    /// End the session
    pub fn shutdown(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::Shutdown)
    }
}

/// One synchronization session, alive for as long as its video is mounted
pub struct SyncSession {
    id: Uuid,
    video_id: String,
    engine: SyncEngine,
    clock_events: mpsc::UnboundedReceiver<ClockEvent>,
    speech_events: broadcast::Receiver<SpeechEvent>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SyncSession {
    /// Wrap an engine in a session. Must be called inside a tokio runtime,
    /// since the clock starts delivering events immediately.
    pub fn new(video_id: impl Into<String>, mut engine: SyncEngine) -> (Self, SessionHandle) {
        let id = Uuid::new_v4();
        let (tx, commands) = mpsc::unbounded_channel();
        let clock_events = engine.subscribe_clock();
        let speech_events = engine.subscribe_speech();

        let session = Self {
            id,
            video_id: video_id.into(),
            engine,
            clock_events,
            speech_events,
            commands,
        };
        (session, SessionHandle { id, commands: tx })
    }

    /// Resolve the clock for `source` and build a ready-to-run session.
    pub fn mount(
        video_id: impl Into<String>,
        source: &VideoSource,
        provider: &dyn SurfaceProvider,
        segments: SegmentList,
        speech: SharedSpeech,
        narration: &NarrationSettings,
        settings: &SyncSettings,
    ) -> Result<(Self, SessionHandle), SyncError> {
        let clock = mount_clock(
            source,
            provider,
            settings.poll_interval(),
            settings.time_granularity_secs,
        )?;
        let engine = SyncEngine::new(
            clock,
            segments,
            speech,
            narration.speech_options(),
            settings,
        );
        Ok(Self::new(video_id, engine))
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register the upward narration-complete callback
    pub fn on_narration_complete(mut self, callback: impl FnMut(usize) + Send + 'static) -> Self {
        self.engine.set_on_narration_complete(callback);
        self
    }

    /// Run until shut down, then release the clock and cancel speech.
    ///
    /// Returns the engine so callers can inspect its final state.
    pub async fn run(self) -> SyncEngine {
        let span = tracing::info_span!("sync_session", session = %self.id, video = %self.video_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> SyncEngine {
        tracing::info!(
            "Session started with {} description segments",
            self.engine.segments().len()
        );

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                event = self.speech_events.recv() => match event {
                    Ok(event) => self.engine.on_speech_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Missed {} speech events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::warn!("Speech engine closed");
                        break;
                    }
                },
                event = self.clock_events.recv() => match event {
                    Some(event) => self.engine.on_clock_event(event),
                    None => {
                        tracing::warn!("Playback clock stopped");
                        break;
                    }
                },
            }
        }

        self.engine.shutdown();
        tracing::info!("Session stopped");
        self.engine
    }

    fn apply(&mut self, command: SessionCommand) {
        tracing::debug!("Session command: {:?}", command);
        match command {
            SessionCommand::SetEnabled(enabled) => self.engine.set_enabled(enabled),
            SessionCommand::ToggleEnabled => self.engine.toggle_enabled(),
            SessionCommand::Skip => self.engine.skip(),
            SessionCommand::ReloadSegments(segments) => self.engine.reload_segments(segments),
            SessionCommand::SetSpeechOptions(options) => self.engine.set_speech_options(options),
            SessionCommand::PauseSpeech => self.engine.pause_speech(),
            SessionCommand::ResumeSpeech => self.engine.resume_speech(),
            SessionCommand::Shutdown => {}
        }
    }
}
