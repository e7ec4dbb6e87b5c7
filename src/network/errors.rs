use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl NetworkError {
    /// Status code when the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::Status { code, .. } => Some(*code),
            NetworkError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
