//! Playback Clock Adapter
//!
//! Presents one control and time-sampling contract over two kinds of video
//! surface:
//!
//! - a native media element, which reports time updates and seeks as events
//!   ([`NativeClock`])
//! - an embedded third-party player, which only exposes its current time and
//!   is therefore polled on a fixed interval ([`PollingClock`])
//!
//! The variant is chosen once per video from the shape of its URL
//! (see [`source`]); everything downstream only sees [`PlaybackClock`].

pub mod native;
pub mod polling;
pub mod simulated;
pub mod source;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

pub use native::NativeClock;
pub use polling::PollingClock;
pub use simulated::{PlayerTiming, SimulatedPlayer};
pub use source::{extract_video_id, resolve_source, SourceError, VideoSource};

/// Errors reported by a playback surface when a control command is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("Player not ready")]
    NotReady,

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Player closed")]
    Closed,
}

/// Which adapter variant drives the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Native media element with time-update events
    Native,
    /// Embedded player sampled on an interval
    Polling,
}

/// Control and time access common to every video surface.
pub trait PlaybackSurface: Send + Sync {
    /// Current playback position in seconds
    fn current_time(&self) -> Result<f64, SurfaceError>;

    /// Start or resume playback
    fn play(&self) -> Result<(), SurfaceError>;

    /// Pause playback
    fn pause(&self) -> Result<(), SurfaceError>;

    /// Check if playback is paused
    fn is_paused(&self) -> bool;
}

/// Notifications raised by a native media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Position advanced during playback
    TimeUpdate(f64),
    /// User or script jumped to a new position
    Seeking(f64),
    /// Playback started
    Play,
    /// Playback paused
    Pause,
    /// End of media reached
    Ended,
}

/// A native media element: a surface that also emits [`MediaEvent`]s.
pub trait MediaElement: PlaybackSurface {
    /// Subscribe to element events
    fn subscribe_events(&self) -> broadcast::Receiver<MediaEvent>;
}

/// Host-side factory for the two surface kinds.
pub trait SurfaceProvider {
    /// Mount an embedded player for an external video id
    fn embedded(&self, video_id: &str) -> Result<Arc<dyn PlaybackSurface>, SurfaceError>;

    /// Mount a native media element for a direct media URL
    fn native(&self, media_url: &str) -> Result<Arc<dyn MediaElement>, SurfaceError>;
}

/// A uniform time sample or discontinuity from the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockEvent {
    /// New time sample, already truncated to the clock granularity
    Sample(f64),
    /// Playback jumped discontinuously; tracking state must be reset
    Seeked(f64),
}

/// The playback clock adapter seen by the sync engine.
pub trait PlaybackClock: Send {
    /// Variant driving this clock
    fn kind(&self) -> ClockKind;

    /// Current position in seconds, truncated to the clock granularity
    fn current_time_seconds(&self) -> Result<f64, SurfaceError>;

    /// Resume playback
    fn play(&self) -> Result<(), SurfaceError>;

    /// Pause playback
    fn pause(&self) -> Result<(), SurfaceError>;

    /// Check if playback is paused
    fn is_paused(&self) -> bool;

    /// Start delivering [`ClockEvent`]s. Must be called inside a tokio runtime.
    ///
    /// Calling it again replaces the previous subscription.
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ClockEvent>;

    /// Stop delivering events and release the background task
    fn stop(&mut self);
}

/// Truncate a time to the sampling granularity (1 second by default).
pub fn quantize(time_seconds: f64, granularity_seconds: f64) -> f64 {
    if granularity_seconds <= 0.0 || !time_seconds.is_finite() {
        return time_seconds;
    }
    (time_seconds / granularity_seconds).floor() * granularity_seconds
}

/// Mount the clock adapter matching a resolved video source.
pub fn mount_clock(
    source: &VideoSource,
    provider: &dyn SurfaceProvider,
    poll_interval: Duration,
    granularity_seconds: f64,
) -> Result<Box<dyn PlaybackClock>, SurfaceError> {
    match source {
        VideoSource::Embedded { video_id } => {
            tracing::info!("Mounting embedded player for video {}", video_id);
            let surface = provider.embedded(video_id)?;
            Ok(Box::new(PollingClock::new(
                surface,
                poll_interval,
                granularity_seconds,
            )))
        }
        VideoSource::Native { media_url } => {
            tracing::info!("Mounting native media element");
            tracing::debug!("Media URL: {}", media_url);
            let element = provider.native(media_url)?;
            Ok(Box::new(NativeClock::new(element, granularity_seconds)))
        }
    }
}
