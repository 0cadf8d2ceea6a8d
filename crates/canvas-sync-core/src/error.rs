//! Run-level error type.
//!
//! Only errors that end a sync run surface here. Per-page, per-file and
//! rotation failures are absorbed where they happen and reported as counts
//! and lists in the final [`crate::engine::SyncReport`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The API answered with an error payload (e.g. invalid token). Never retried.
    #[error("API error: {0}")]
    Api(String),

    /// The API host could not be reached at all. Triggers the run-level
    /// halve-and-restart policy.
    #[error("connection error: {0}")]
    Connect(String),

    /// The user interrupted the run.
    #[error("sync cancelled by user")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SyncError {
    /// True when the run may be retried with fewer connections.
    pub fn is_connect(&self) -> bool {
        matches!(self, SyncError::Connect(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connect_errors_are_restartable() {
        assert!(SyncError::Connect("refused".into()).is_connect());
        assert!(!SyncError::Api("Invalid access token.".into()).is_connect());
        assert!(!SyncError::Cancelled.is_connect());
    }

    #[test]
    fn display_includes_api_message() {
        let e = SyncError::Api("Invalid access token.".into());
        assert_eq!(e.to_string(), "API error: Invalid access token.");
    }
}
