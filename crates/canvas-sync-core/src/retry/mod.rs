//! Retry and backoff for metadata requests.
//!
//! Each request is classified (timeout, throttling, connection failure,
//! malformed body) and retried with exponential backoff. What happens once
//! the budget is spent is up to the API client.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status, classify_reqwest_error};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
