use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The request never produced an HTTP response (connect, timeout, reset).
    #[error("network error: {0}")]
    Transport(String),

    /// Non-success status from the backend.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("session storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Builds a backend error from a response body, preferring its
    /// `message` field, then `error`, then a generic fallback.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| json.get(*key)?.as_str().filter(|m| !m.trim().is_empty()).map(str::to_string))
            })
            .unwrap_or_else(|| format!("Request failed (HTTP {})", status));
        Self::Backend { status, message }
    }

    /// Only safe to retry for idempotent requests.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Transport(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Backend { message, .. } => message.clone(),
            Self::Decode(_) => "The server sent an unexpected response.".to_string(),
            Self::Storage(_) | Self::Io(_) => "Could not access local session data.".to_string(),
            Self::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
