use axum::http::StatusCode;
use thiserror::Error;

/// Every way a webhook operation can fail. Each variant maps to exactly one
/// HTTP status in the response writer.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A required setting is absent. Always a deployment bug.
    #[error("{0}")]
    Configuration(String),

    /// The caller's key did not match the shared secret.
    #[error("invalid key")]
    Unauthorized,

    /// The inbound body is not a Telegram update.
    #[error("invalid update payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Telegram was unreachable or reported a failure.
    #[error("{0}")]
    Upstream(String),
}

impl WebhookError {
    pub fn missing_env(name: &str) -> Self {
        WebhookError::Configuration(format!("{} is not set", name))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::Configuration(_) | WebhookError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::Decode(_) => StatusCode::BAD_REQUEST,
        }
    }
}
