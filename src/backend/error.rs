use reqwest::StatusCode;

/// Failure of a single backend call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// True when the backend rejected the API key
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            BackendError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}
