//! Video-Description Synchronization
//!
//! Watches playback time, narrates each description once when playback enters
//! its range, and resumes playback when narration completes.
//!
//! - [`tracker`]: pure range-tracking decision per time sample
//! - [`narration`]: pause, speak, resume cycle against the speech engine
//! - [`engine`]: synchronous core combining the two
//! - [`session`]: async orchestration for one mounted video
//! - [`loader`]: fetching a video and its descriptions before mounting

pub mod engine;
pub mod loader;
pub mod narration;
pub mod session;
pub mod state;
pub mod tracker;

use thiserror::Error;

pub use engine::{CompletionCallback, SyncEngine};
pub use loader::{load_video, LoadedVideo};
pub use narration::{NarrationController, NarrationOutcome, NarrationPhase};
pub use session::{SessionCommand, SessionHandle, SyncSession};
pub use state::PlaybackState;
pub use tracker::{track, Decision, Sample};

/// Errors that can end or prevent a synchronization session
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Video source error: {0}")]
    Source(#[from] crate::playback::SourceError),

    #[error("Playback surface error: {0}")]
    Surface(#[from] crate::playback::SurfaceError),

    #[error("Service error: {0}")]
    Service(#[from] crate::services::ServiceError),

    #[error("Session is no longer running")]
    SessionClosed,
}
