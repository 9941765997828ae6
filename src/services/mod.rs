//! Remote collaborators: authentication, description storage, the video
//! catalog and the question answering service.
//!
//! Each collaborator is a narrow trait with one HTTP implementation, so the
//! sync engine and the preview binary can run against fakes.

pub mod ask;
pub mod catalog;
pub mod descriptions;

use crate::descriptions::AuthoringError;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

pub use ask::{AnsweredQuestion, AskClient, AskRequest};
pub use catalog::{HttpVideoCatalog, VideoCatalog, VideoKey, VideoPage, VideoRecord, VideoSummary};
pub use descriptions::{DescriptionStore, DescriptionUpdate, HttpDescriptionStore, NewDescription};

/// Errors talking to remote services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Video not found")]
    VideoNotFound,

    #[error("Not signed in")]
    Unauthenticated,

    #[error("{0}")]
    Validation(#[from] AuthoringError),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ServiceError::Status(status.as_u16())
        } else {
            ServiceError::Http(e.to_string())
        }
    }
}

/// Build the shared HTTP client used by every service.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ServiceError::Http(e.to_string()))
}

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Display name, recorded as the author of descriptions
    pub username: String,
    /// Contact email, when known
    pub email: Option<String>,
}

/// Authentication provider.
pub trait AuthProvider: Send + Sync {
    /// Currently signed-in user
    fn current_user(&self) -> Option<AuthUser>;

    /// Whether a user is signed in
    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Forget the signed-in user
    fn sign_out(&self);

    /// Bearer token for authenticated requests
    fn token(&self) -> Option<String>;
}

/// Authentication from a user name and token supplied up front
#[derive(Debug, Default)]
pub struct TokenAuth {
    inner: RwLock<Option<(AuthUser, String)>>,
}

impl TokenAuth {
    /// Signed in as `username` with `token`
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        let user = AuthUser {
            username: username.into(),
            email: None,
        };
        Self {
            inner: RwLock::new(Some((user, token.into()))),
        }
    }

    /// Not signed in
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl AuthProvider for TokenAuth {
    fn current_user(&self) -> Option<AuthUser> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(user, _)| user.clone())
    }

    fn sign_out(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Signed out");
    }

    fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, token)| token.clone())
    }
}
