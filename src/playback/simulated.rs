//! Simulated video player
//!
//! Stands in for a real video surface in the preview binary and in tests.
//! Position either follows the runtime clock while playing or moves only when
//! the caller sets it, and control commands can be made to fail on demand.

use super::{MediaElement, MediaEvent, PlaybackSurface, SurfaceError};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// How the simulated position advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerTiming {
    /// Position advances with the runtime clock while playing
    RealTime,
    /// Position only changes through `set_time`, `advance` or `seek`
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Playing,
    Paused,
    Ended,
}

#[derive(Debug)]
struct PlayerState {
    status: Status,
    /// Position at `anchor`
    position: f64,
    anchor: Instant,
    pause_failures: u32,
    play_failures: u32,
}

/// In-memory video surface
pub struct SimulatedPlayer {
    timing: PlayerTiming,
    duration: f64,
    state: RwLock<PlayerState>,
    event_tx: broadcast::Sender<MediaEvent>,
}

impl SimulatedPlayer {
    /// Create a paused player of the given length in seconds
    pub fn new(duration_seconds: f64, timing: PlayerTiming) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            timing,
            duration: duration_seconds.max(0.0),
            state: RwLock::new(PlayerState {
                status: Status::Paused,
                position: 0.0,
                anchor: Instant::now(),
                pause_failures: 0,
                play_failures: 0,
            }),
            event_tx,
        }
    }

    /// Player whose position is driven entirely by the caller
    pub fn manual(duration_seconds: f64) -> Self {
        Self::new(duration_seconds, PlayerTiming::Manual)
    }

    fn read(&self) -> RwLockReadGuard<'_, PlayerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlayerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn position_of(&self, state: &PlayerState) -> f64 {
        let position = match (self.timing, state.status) {
            (PlayerTiming::RealTime, Status::Playing) => {
                state.position + state.anchor.elapsed().as_secs_f64()
            }
            _ => state.position,
        };
        position.min(self.duration)
    }

    /// Total length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Current position without error wrapping
    pub fn position(&self) -> f64 {
        let state = self.read();
        self.position_of(&state)
    }

    /// Whether the end of the media has been reached
    pub fn is_ended(&self) -> bool {
        let mut state = self.write();
        self.refresh_end(&mut state);
        state.status == Status::Ended
    }

    fn refresh_end(&self, state: &mut PlayerState) {
        if state.status == Status::Playing && self.position_of(state) >= self.duration {
            state.position = self.duration;
            state.status = Status::Ended;
            let _ = self.event_tx.send(MediaEvent::Ended);
        }
    }

    /// Move to `seconds` as ordinary playback progress and report a time update
    pub fn set_time(&self, seconds: f64) {
        let position = {
            let mut state = self.write();
            state.position = seconds.clamp(0.0, self.duration);
            state.anchor = Instant::now();
            state.position
        };
        let _ = self.event_tx.send(MediaEvent::TimeUpdate(position));
    }

    /// Advance a manual player by `delta`, as playback would
    pub fn advance(&self, delta: Duration) {
        let next = self.position() + delta.as_secs_f64();
        self.set_time(next);
    }

    /// Jump to `seconds`, reporting a seek followed by a time update
    pub fn seek(&self, seconds: f64) {
        let position = {
            let mut state = self.write();
            state.position = seconds.clamp(0.0, self.duration);
            state.anchor = Instant::now();
            if state.status == Status::Ended && state.position < self.duration {
                state.status = Status::Paused;
            }
            state.position
        };
        tracing::debug!("Seek to {:.2}s", position);
        let _ = self.event_tx.send(MediaEvent::Seeking(position));
        let _ = self.event_tx.send(MediaEvent::TimeUpdate(position));
    }

    /// Report the current position as a time update, as a media element does
    /// periodically while playing
    pub fn tick(&self) {
        let position = {
            let mut state = self.write();
            self.refresh_end(&mut state);
            self.position_of(&state)
        };
        let _ = self.event_tx.send(MediaEvent::TimeUpdate(position));
    }

    /// Make the next `count` pause commands fail
    pub fn fail_next_pauses(&self, count: u32) {
        self.write().pause_failures = count;
    }

    /// Make the next `count` play commands fail
    pub fn fail_next_plays(&self, count: u32) {
        self.write().play_failures = count;
    }
}

impl PlaybackSurface for SimulatedPlayer {
    fn current_time(&self) -> Result<f64, SurfaceError> {
        Ok(self.position())
    }

    fn play(&self) -> Result<(), SurfaceError> {
        let mut state = self.write();
        if state.play_failures > 0 {
            state.play_failures -= 1;
            return Err(SurfaceError::Rejected("play".to_string()));
        }

        if state.status == Status::Paused {
            state.anchor = Instant::now();
            state.status = Status::Playing;
            let _ = self.event_tx.send(MediaEvent::Play);
            tracing::debug!("Video playback started");
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), SurfaceError> {
        let mut state = self.write();
        if state.pause_failures > 0 {
            state.pause_failures -= 1;
            return Err(SurfaceError::Rejected("pause".to_string()));
        }

        if state.status == Status::Playing {
            state.position = self.position_of(&state);
            state.anchor = Instant::now();
            state.status = Status::Paused;
            let _ = self.event_tx.send(MediaEvent::Pause);
            tracing::debug!("Video playback paused");
        }
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.read().status != Status::Playing
    }
}

impl MediaElement for SimulatedPlayer {
    fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent> {
        self.event_tx.subscribe()
    }
}
