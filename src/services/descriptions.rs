//! Description storage service client.

use super::{http_client, AuthProvider, ServiceError};
use crate::descriptions::{validate_description, validate_timestamps, DescriptionId, DescriptionRecord};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Sentinel the service returns instead of a list for unknown videos.
const VIDEO_NOT_FOUND: &str = "VIDEO_NOT_FOUND";

/// A description to add, with timestamps as entered (whole seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct NewDescription {
    pub video_id: String,
    pub text: String,
    pub start: String,
    pub end: String,
}

/// A replacement for an existing description
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionUpdate {
    pub id: DescriptionId,
    pub text: String,
    pub start: String,
    pub end: String,
}

/// Storage for description records keyed by video.
pub trait DescriptionStore: Send + Sync {
    /// All descriptions for a video
    fn fetch(
        &self,
        video_id: &str,
    ) -> impl Future<Output = Result<Vec<DescriptionRecord>, ServiceError>> + Send;

    /// Add a description
    fn create(&self, description: NewDescription) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Replace a description's text and range
    fn update(&self, update: DescriptionUpdate) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Remove a description
    fn delete(&self, id: DescriptionId) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

#[derive(Debug, Deserialize)]
struct DescriptionsResponse {
    descriptions: DescriptionsField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionsField {
    Records(Vec<DescriptionRecord>),
    Sentinel(String),
}

#[derive(Debug, Serialize, PartialEq)]
struct CreatePayload {
    video_id: String,
    text_history: String,
    time_stamp_start: i64,
    time_stamp_end: i64,
    username_history: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct UpdatePayload {
    id: DescriptionId,
    modified_descriptions: String,
    time_stamp_start: i64,
    time_stamp_end: i64,
    username: Option<String>,
    jwt: String,
}

/// Decode the body of a fetch response.
fn parse_descriptions(body: &str) -> Result<Vec<DescriptionRecord>, ServiceError> {
    let response: DescriptionsResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

    match response.descriptions {
        DescriptionsField::Records(records) => Ok(records),
        DescriptionsField::Sentinel(s) if s == VIDEO_NOT_FOUND => Err(ServiceError::VideoNotFound),
        DescriptionsField::Sentinel(s) => Err(ServiceError::Decode(format!(
            "unexpected descriptions value {:?}",
            s
        ))),
    }
}

fn create_payload(
    description: NewDescription,
    username: Option<String>,
) -> Result<CreatePayload, ServiceError> {
    let (start, end) = validate_timestamps(&description.start, &description.end)?;
    validate_description(&description.text)?;

    Ok(CreatePayload {
        video_id: description.video_id,
        text_history: description.text.trim().to_string(),
        time_stamp_start: start,
        time_stamp_end: end,
        username_history: username,
    })
}

fn update_payload(
    update: DescriptionUpdate,
    username: Option<String>,
    token: Option<String>,
) -> Result<UpdatePayload, ServiceError> {
    let (start, end) = validate_timestamps(&update.start, &update.end)?;
    validate_description(&update.text)?;
    let jwt = token.ok_or(ServiceError::Unauthenticated)?;

    Ok(UpdatePayload {
        id: update.id,
        modified_descriptions: update.text.trim().to_string(),
        time_stamp_start: start,
        time_stamp_end: end,
        username,
        jwt,
    })
}

/// Description store backed by the HTTP descriptions service
pub struct HttpDescriptionStore {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthProvider>,
}

impl HttpDescriptionStore {
    /// Create a client for the service at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn username(&self) -> Option<String> {
        self.auth.current_user().map(|u| u.username)
    }
}

impl DescriptionStore for HttpDescriptionStore {
    async fn fetch(&self, video_id: &str) -> Result<Vec<DescriptionRecord>, ServiceError> {
        tracing::debug!("Fetching descriptions for video {}", video_id);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("video_id", video_id)])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let records = parse_descriptions(&body)?;
        tracing::info!("Fetched {} descriptions for video {}", records.len(), video_id);
        Ok(records)
    }

    async fn create(&self, description: NewDescription) -> Result<(), ServiceError> {
        let payload = create_payload(description, self.username())?;

        self.http
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("Created description for video {}", payload.video_id);
        Ok(())
    }

    async fn update(&self, update: DescriptionUpdate) -> Result<(), ServiceError> {
        let payload = update_payload(update, self.username(), self.auth.token())?;

        self.http
            .put(&self.base_url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("Updated description {}", payload.id);
        Ok(())
    }

    async fn delete(&self, id: DescriptionId) -> Result<(), ServiceError> {
        self.http
            .delete(format!("{}/{}", self.base_url, id))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("Deleted description {}", id);
        Ok(())
    }
}
