use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("not signed in or session expired")]
    Unauthorized,

    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Unsupported(String),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build from a non-2xx response body, preferring the server's `message`
    pub(crate) fn from_response(status: u16, body: &[u8]) -> Self {
        if status == 401 {
            return ClientError::Unauthorized;
        }
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
        ClientError::Status { status, message }
    }
}
