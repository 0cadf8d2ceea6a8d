//! Classify HTTP status and reqwest errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Classify a reqwest error for retry decisions.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ErrorKind {
    if e.is_timeout() {
        return ErrorKind::Timeout;
    }
    if e.is_connect() || e.is_request() || e.is_body() {
        return ErrorKind::Connection;
    }
    if e.is_decode() {
        return ErrorKind::Decode;
    }
    if let Some(status) = e.status() {
        return classify_http_status(status.as_u16());
    }
    ErrorKind::Other
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Transport(re) => classify_reqwest_error(re),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::Decode(_) => ErrorKind::Decode,
        FetchError::Closed => ErrorKind::Other,
    }
}
