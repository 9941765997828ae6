//! VidScribe - Synchronized Audio Description Narration
//!
//! Plays scene descriptions for a video through a speech engine, in step with
//! playback. When playback enters a description's time range, the video is
//! paused, the description is spoken, and playback resumes once narration
//! completes. Seeks, range transitions and the differences between native and
//! embedded players are handled by the sync engine.

pub mod descriptions;
pub mod playback;
pub mod services;
pub mod speech;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use descriptions::{DescriptionSegment, SegmentList};
pub use playback::{PlaybackClock, PlaybackSurface, VideoSource};
pub use speech::{SharedSpeech, SpeechEngine};
pub use storage::config::AppConfig;
pub use sync::{SyncEngine, SyncError, SyncSession};
