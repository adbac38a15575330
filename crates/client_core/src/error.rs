use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("field '{field}' has unsupported value '{value}'")]
    InvalidField { field: String, value: String },
    #[error("no attendance selected for {student}")]
    MissingSelection { student: String },
}

impl ClientError {
    /// Text suitable for the page's message area.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
