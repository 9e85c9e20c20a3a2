//! Audio feature source error types.

use thiserror::Error;

/// Errors that can occur when retrieving audio features.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The service rejected our credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No recording or feature set exists for the answer.
    #[error("features not found: {0}")]
    NotFound(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A feature file or response body could not be decoded.
    #[error("invalid feature data: {0}")]
    InvalidData(String),
}

impl SourceError {
    /// Whether retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        match self {
            SourceError::AuthenticationFailed(_)
            | SourceError::NotFound(_)
            | SourceError::InvalidData(_) => true,
            SourceError::ApiError { status, .. } => *status < 500 && *status != 429,
            SourceError::Timeout(_) | SourceError::NetworkError(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_errors() {
        assert!(SourceError::NotFound("a1".into()).is_permanent());
        assert!(SourceError::ApiError {
            status: 400,
            message: "bad".into()
        }
        .is_permanent());
        assert!(!SourceError::ApiError {
            status: 503,
            message: "busy".into()
        }
        .is_permanent());
        assert!(!SourceError::ApiError {
            status: 429,
            message: "slow down".into()
        }
        .is_permanent());
        assert!(!SourceError::Timeout(500).is_permanent());
    }
}
