//! Loading a video and its descriptions ahead of mounting a session.

use super::SyncError;
use crate::descriptions::{select_primary_author, SegmentList};
use crate::playback::VideoSource;
use crate::services::{DescriptionStore, VideoCatalog};

/// Everything a session needs to know about a video before it mounts
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedVideo {
    pub video_id: String,
    pub title: String,
    pub source: VideoSource,
    /// Narration track of the primary author
    pub segments: SegmentList,
}

/// Fetch a video's record and descriptions and resolve where it plays from.
///
/// A video without a playable source fails with [`SyncError::Source`] before
/// its descriptions are requested.
pub async fn load_video<C, S>(catalog: &C, store: &S, video_id: &str) -> Result<LoadedVideo, SyncError>
where
    C: VideoCatalog,
    S: DescriptionStore,
{
    let record = catalog.get_video(video_id).await?;
    let source = record.source()?;
    tracing::info!(
        "Video {} ({}) plays {}",
        video_id,
        record.title,
        if source.is_embedded() { "embedded" } else { "natively" }
    );

    let records = store.fetch(video_id).await?;
    let total = records.len();
    let segments = SegmentList::from_records(select_primary_author(records));
    tracing::debug!("Using {} of {} description records", segments.len(), total);

    Ok(LoadedVideo {
        video_id: video_id.to_string(),
        title: record.title,
        source,
        segments,
    })
}
