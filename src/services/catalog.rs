//! Video catalog client.

use super::{http_client, ServiceError};
use crate::playback::{resolve_source, SourceError, VideoSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Video identifier; the catalog uses both numbers and strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoKey {
    Number(u64),
    Text(String),
}

impl fmt::Display for VideoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoKey::Number(n) => write!(f, "{}", n),
            VideoKey::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Per-video metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    /// External URL the video was submitted with
    #[serde(default)]
    pub url: Option<String>,
    /// Direct media URL for uploaded videos
    #[serde(default)]
    pub video_presigned_url: Option<String>,
}

impl VideoRecord {
    /// Where this video plays from.
    pub fn source(&self) -> Result<VideoSource, SourceError> {
        resolve_source(self.url.as_deref(), self.video_presigned_url.as_deref())
    }
}

/// Catalog listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: VideoKey,
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Length in seconds
    #[serde(default)]
    pub video_length: Option<f64>,
    #[serde(default)]
    pub thumbnail_presigned_url: Option<String>,
}

/// One page of the catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPage {
    pub videos: Vec<VideoSummary>,
    /// Token for the following page, if any
    pub next_page: Option<String>,
}

/// Video catalog.
pub trait VideoCatalog: Send + Sync {
    /// Metadata for one video
    fn get_video(&self, video_id: &str) -> impl Future<Output = Result<VideoRecord, ServiceError>> + Send;

    /// One page of the catalog; `None` asks for the first page
    fn list_videos(
        &self,
        page: Option<&str>,
    ) -> impl Future<Output = Result<VideoPage, ServiceError>> + Send;
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    video: VideoRecord,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    videos: Vec<ListItem>,
    #[serde(default)]
    next_page: Option<String>,
}

/// Listing entries arrive either as objects or as JSON-encoded strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListItem {
    Summary(VideoSummary),
    Encoded(String),
}

fn parse_video_page(body: &str) -> Result<VideoPage, ServiceError> {
    let response: ListResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

    let videos = response
        .videos
        .into_iter()
        .filter_map(|item| match item {
            ListItem::Summary(summary) => Some(summary),
            ListItem::Encoded(text) => match serde_json::from_str(&text) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!("Skipping unreadable catalog entry: {}", e);
                    None
                }
            },
        })
        .collect();

    Ok(VideoPage {
        videos,
        next_page: response.next_page,
    })
}

/// Video catalog backed by the HTTP videos service
pub struct HttpVideoCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpVideoCatalog {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl VideoCatalog for HttpVideoCatalog {
    async fn get_video(&self, video_id: &str) -> Result<VideoRecord, ServiceError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("video_id", video_id)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::VideoNotFound);
        }

        let body: VideoResponse = response.error_for_status()?.json().await?;
        tracing::debug!("Loaded video {}: {}", video_id, body.video.title);
        Ok(body.video)
    }

    async fn list_videos(&self, page: Option<&str>) -> Result<VideoPage, ServiceError> {
        let mut request = self.http.get(&self.base_url);
        if let Some(page) = page {
            request = request.query(&[("page", page)]);
        }

        let body = request.send().await?.error_for_status()?.text().await?;
        parse_video_page(&body)
    }
}
