//! Question answering about video content.

use super::catalog::VideoKey;
use super::{http_client, ServiceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answers can take a while; frames are extracted server-side for hosted videos.
pub const ASK_TIMEOUT: Duration = Duration::from_secs(120);

/// A question about the video around one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    pub video_id: String,
    pub question: String,
    /// Times in seconds the screenshots were (or should be) taken at
    pub timestamps: Vec<f64>,
    /// Base64-encoded frames; empty lets the service extract them
    pub screenshots_base64: Vec<String>,
    /// Description text near the question time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_ad: Option<String>,
    /// Video URL the service can fetch frames from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

impl AskRequest {
    /// Question with server-side frame extraction around `time_seconds`
    pub fn new(video_id: impl Into<String>, question: impl Into<String>, time_seconds: f64) -> Self {
        Self {
            video_id: video_id.into(),
            question: question.into(),
            timestamps: Self::timestamps_around(time_seconds, 3, 1.0),
            screenshots_base64: Vec::new(),
            video_ad: None,
            youtube_url: None,
        }
    }

    /// `count` timestamps centred on `center`, `interval` seconds apart,
    /// rounded to milliseconds.
    pub fn timestamps_around(center: f64, count: usize, interval: f64) -> Vec<f64> {
        let half = (count / 2) as f64;
        (0..count)
            .map(|i| {
                let t = center + (i as f64 - half) * interval;
                (t * 1000.0).round() / 1000.0
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    #[serde(default)]
    gemini_response: Option<serde_json::Value>,
}

/// A previously answered question
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnsweredQuestion {
    pub id: u64,
    pub question: String,
    pub answer: String,
    /// Video time in seconds the question was asked at
    pub timestamp: f64,
    pub video_id: VideoKey,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    questions: QuestionsField,
}

/// The service answers with a message string instead of a list when a video
/// has no questions yet.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionsField {
    Answered(Vec<AnsweredQuestion>),
    Message(String),
}

fn parse_history(body: &str) -> Result<Vec<AnsweredQuestion>, ServiceError> {
    let response: HistoryResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

    match response.questions {
        QuestionsField::Answered(questions) => Ok(questions),
        QuestionsField::Message(message) => {
            tracing::debug!("No question history: {}", message);
            Ok(Vec::new())
        }
    }
}

/// Render the answer: plain strings as-is, structured answers as pretty JSON.
fn render_answer(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Client for the question answering service
pub struct AskClient {
    http: reqwest::Client,
    url: String,
}

impl AskClient {
    /// Create a client for the service at `url`
    pub fn new(url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(ASK_TIMEOUT)?,
            url: url.into(),
        })
    }

    /// Ask a question and return the answer text.
    pub async fn ask(&self, request: &AskRequest) -> Result<String, ServiceError> {
        tracing::info!(
            "Asking about video {} at {:?}",
            request.video_id,
            request.timestamps
        );

        let response: AskResponse = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .gemini_response
            .map(render_answer)
            .ok_or_else(|| ServiceError::Decode("response has no answer".to_string()))
    }

    /// Questions already asked about a video, oldest first.
    pub async fn history(&self, video_id: &str) -> Result<Vec<AnsweredQuestion>, ServiceError> {
        let url = format!("{}/{}", self.url.trim_end_matches('/'), video_id);
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_history(&body)
    }
}
