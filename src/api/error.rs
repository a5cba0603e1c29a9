use thiserror::Error;

/// osu! API client errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("No API credentials configured")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Beatmapset {0} not found")]
    NotFound(u64),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Errors that no amount of retrying fixes until the user edits the
    /// credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::MissingCredentials | ApiError::Auth(_))
    }
}
