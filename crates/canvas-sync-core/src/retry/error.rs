//! Metadata request error type for retry classification.

use std::fmt;

/// Error returned by a single metadata request (transport failure, retryable
/// HTTP status, or an unreadable body). Kept separate from `SyncError` so we
/// can classify and decide retries before deciding what the caller sees.
#[derive(Debug)]
pub enum FetchError {
    /// reqwest reported an error (timeout, connection, etc.).
    Transport(reqwest::Error),
    /// Response had a status worth retrying (429, 5xx).
    Http(u16),
    /// Body was not the JSON we expected.
    Decode(String),
    /// The connection pool was closed while waiting for a slot (run cancelled).
    Closed,
}

impl FetchError {
    /// True when the host could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, FetchError::Transport(e) if e.is_connect())
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Decode(msg) => write!(f, "malformed response: {}", msg),
            FetchError::Closed => write!(f, "connection pool closed"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(e) => Some(e),
            FetchError::Http(_) | FetchError::Decode(_) | FetchError::Closed => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e)
        }
    }
}
