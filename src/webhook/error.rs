//! Webhook error definitions.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while delivering a notification.
///
/// None of these reach the client; the dispatcher logs them and moves on.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Connection, TLS or protocol failure talking to the webhook target.
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The attempt did not finish before the deadline.
    #[error("webhook timed out after {0:?}")]
    Timeout(Duration),

    /// The target answered with a non-success status.
    #[error("webhook rejected notification with status {status}")]
    Rejected { status: u16 },

    /// The container metadata lookup failed.
    #[error("container info unavailable: {0}")]
    ContainerInfo(String),

    /// A webhook URL is persisted without its credential.
    #[error("webhook for container {container} has no stored credential")]
    MissingCredential { container: String },

    /// The persisted webhook URL cannot be used as a POST target.
    #[error("invalid webhook target '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("failed to serialize notification: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl WebhookError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookError::Transport(_) => "transport",
            WebhookError::Timeout(_) => "timeout",
            WebhookError::Rejected { .. } => "rejected",
            WebhookError::ContainerInfo(_) => "container_info",
            WebhookError::MissingCredential { .. } => "missing_credential",
            WebhookError::InvalidTarget { .. } => "invalid_target",
            WebhookError::Serialize(_) => "serialize",
        }
    }
}

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;
