//! HTTP HEAD size probing for remote files.
//!
//! Sizes drive the oversized-file rule and the byte totals in the plan. A
//! HEAD that fails for any reason other than an unreachable host yields size
//! 0 and a warning; an unreachable host is a run-level connect error.

mod parse;

pub use parse::parse_headers;

use crate::api::ApiClient;
use crate::error::{Result, SyncError};

/// Headers of a HEAD response the planner cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
}

impl HeadResult {
    pub fn size(&self) -> u64 {
        self.content_length.unwrap_or(0)
    }
}

/// Performs a HEAD request (redirects followed) and returns parsed metadata.
pub async fn probe(client: &ApiClient, url: &str) -> Result<HeadResult> {
    let resp = client.send_head(url).await?;
    if !resp.status().is_success() {
        tracing::warn!(%url, status = resp.status().as_u16(), "HEAD refused, assuming size 0");
        return Ok(HeadResult::default());
    }
    Ok(parse_headers(resp.headers()))
}

/// Size of the file at `url` in bytes. Non-connection failures count as 0.
pub async fn remote_size(client: &ApiClient, url: &str) -> Result<u64> {
    match probe(client, url).await {
        Ok(head) => Ok(head.size()),
        Err(e @ (SyncError::Connect(_) | SyncError::Cancelled)) => Err(e),
        Err(e) => {
            tracing::warn!(%url, error = %e, "HEAD failed, assuming size 0");
            Ok(0)
        }
    }
}
