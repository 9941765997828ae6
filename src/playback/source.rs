//! Video source resolution
//!
//! A video is played through the embedded player when a valid external video
//! id can be parsed from its URL, and through a native media element
//! otherwise. The decision is made once per video.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted external URL shapes; ids are exactly eleven URL-safe characters.
static EXTERNAL_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:(?:www|m)\.)?(?:youtu\.be/(?P<short>[A-Za-z0-9_-]{11})|youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#\s]*&)?v=(?P<watch>[A-Za-z0-9_-]{11})|(?:embed|v|shorts)/(?P<path>[A-Za-z0-9_-]{11})))(?:[?&#/]\S*)?$",
    )
    .expect("external video URL pattern is valid")
});

/// Errors resolving where a video plays from
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("No playable source for video")]
    NoSource,
}

/// Where a video is played from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoSource {
    /// Third-party embedded player, addressed by its video id
    Embedded { video_id: String },
    /// Direct media URL for a native element
    Native { media_url: String },
}

impl VideoSource {
    /// Whether this source needs the polling clock
    pub fn is_embedded(&self) -> bool {
        matches!(self, VideoSource::Embedded { .. })
    }
}

/// Extract the external video id from a URL, if it has a recognized shape.
pub fn extract_video_id(url: &str) -> Option<String> {
    let captures = EXTERNAL_URL.captures(url.trim())?;
    ["short", "watch", "path"]
        .iter()
        .find_map(|name| captures.name(name))
        .map(|m| m.as_str().to_string())
}

/// Decide how a video plays.
///
/// `external_url` wins when it contains a valid id; otherwise `media_url`
/// is used as a direct media source.
pub fn resolve_source(
    external_url: Option<&str>,
    media_url: Option<&str>,
) -> Result<VideoSource, SourceError> {
    if let Some(video_id) = external_url.and_then(extract_video_id) {
        return Ok(VideoSource::Embedded { video_id });
    }

    match media_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(media_url) => {
            if external_url.is_some() {
                tracing::debug!("External URL not recognized; using direct media URL");
            }
            Ok(VideoSource::Native {
                media_url: media_url.to_string(),
            })
        }
        None => Err(SourceError::NoSource),
    }
}
