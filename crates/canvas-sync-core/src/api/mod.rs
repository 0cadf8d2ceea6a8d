//! Shared HTTP client for the Canvas API and file downloads.
//!
//! One `reqwest::Client` carries the bearer token, proxy and timeouts; one
//! counting semaphore bounds every request the engine makes (page fetches,
//! HEAD probes and streaming GETs), so `connection_count` is a hard ceiling
//! on concurrent connections.

mod types;

pub use types::{api_error_message, ApiCourse, ApiFile, ApiFolder};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::pagination::Page;
use crate::retry::{classify_http_status, run_with_retry, ErrorKind, FetchError, RetryPolicy};

/// Maximum redirects followed per request (file URLs redirect to storage hosts).
const MAX_REDIRECTS: usize = 10;

/// Attempts per HEAD or download GET when the connection itself fails.
const TRANSPORT_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    permits: Arc<Semaphore>,
    connection_count: usize,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client for `cfg` allowing at most `connection_count` concurrent requests.
    pub fn new(cfg: &SyncConfig, connection_count: usize) -> Result<Self> {
        let connection_count = connection_count.max(1);

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.token.trim()))
            .map_err(|e| SyncError::Config(format!("token is not a valid header value: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .pool_max_idle_per_host(connection_count)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("canvas-sync/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = cfg.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| SyncError::Config(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build()?,
            api_base: cfg.api_base(),
            permits: Arc::new(Semaphore::new(connection_count)),
            connection_count,
            retry: cfg.retry_policy(),
        })
    }

    /// Connection ceiling this client was built with.
    pub fn connection_count(&self) -> usize {
        self.connection_count
    }

    /// Absolute URL for an API path such as `courses/12/files`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Stop handing out connections. Pending and future requests fail with `SyncError::Cancelled`.
    /// The engine calls this when the run is aborted.
    pub fn close(&self) {
        self.permits.close();
    }

    /// GET a JSON body with local retries.
    ///
    /// Returns `Ok(None)` when the retry budget is exhausted on a transient
    /// error. A connection failure on the last attempt is surfaced as
    /// `SyncError::Connect` so the run can restart with fewer connections.
    pub async fn get_json(&self, url: &str) -> Result<Option<Value>> {
        match run_with_retry(&self.retry, || self.fetch_json_once(url)).await {
            Ok(body) => Ok(Some(body)),
            Err(FetchError::Closed) => Err(SyncError::Cancelled),
            Err(e) if e.is_connect() => Err(SyncError::Connect(format!("{url}: {e}"))),
            Err(e) => {
                tracing::warn!(%url, error = %e, "giving up on request");
                Ok(None)
            }
        }
    }

    async fn fetch_json_once(&self, url: &str) -> std::result::Result<Value, FetchError> {
        let _permit = self.permits.acquire().await.map_err(|_| FetchError::Closed)?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status().as_u16();
        if classify_http_status(status) != ErrorKind::Other {
            return Err(FetchError::Http(status));
        }
        // Canvas reports most client errors as JSON bodies, so 4xx is parsed like success.
        Ok(resp.json::<Value>().await?)
    }

    /// Fetch one page of a list endpoint.
    ///
    /// An empty list or a non-list body ends the listing. Entries that do not
    /// deserialize as `T` are dropped. With `check_error`, an error payload is
    /// fatal (`SyncError::Api`) instead of ending the listing.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        check_error: bool,
    ) -> Result<Page<Vec<T>>> {
        let Some(body) = self.get_json(url).await? else {
            return Ok(Page::Failed);
        };
        if check_error {
            if let Some(message) = api_error_message(&body) {
                return Err(SyncError::Api(message));
            }
        }
        match body {
            Value::Array(items) if items.is_empty() => Ok(Page::End),
            Value::Array(items) => Ok(Page::Items(
                items
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<T>(item) {
                        Ok(v) => Some(v),
                        Err(e) => {
                            tracing::debug!(%url, error = %e, "skipping unreadable entry");
                            None
                        }
                    })
                    .collect(),
            )),
            _ => {
                tracing::debug!(%url, "non-list page body, treating as end of listing");
                Ok(Page::End)
            }
        }
    }

    /// GET a single JSON object. `None` if it could not be fetched or did not deserialize.
    pub async fn get_object<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let Some(body) = self.get_json(url).await? else {
            return Ok(None);
        };
        match serde_json::from_value(body) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::debug!(%url, error = %e, "unexpected object body");
                Ok(None)
            }
        }
    }

    /// Start a streaming GET. The returned permit must be held until the body is consumed.
    pub async fn open_download(&self, url: &str) -> Result<(OwnedSemaphorePermit, reqwest::Response)> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| SyncError::Cancelled)?;
        let resp = self.send_with_retry(|| self.http.get(url)).await?;
        Ok((permit, resp))
    }

    pub(crate) async fn send_head(&self, url: &str) -> Result<reqwest::Response> {
        let _permit = self.permits.acquire().await.map_err(|_| SyncError::Cancelled)?;
        self.send_with_retry(|| self.http.head(url)).await
    }

    /// Send with a few quick retries on transport failures only. The caller holds the permit.
    async fn send_with_retry<F>(&self, request: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let policy = RetryPolicy {
            max_attempts: TRANSPORT_ATTEMPTS,
            ..self.retry
        };
        run_with_retry(&policy, || {
            let sent = request().send();
            async move { sent.await.map_err(FetchError::Transport) }
        })
        .await
        .map_err(|e| match e {
            FetchError::Transport(e) => request_error(e),
            other => SyncError::Io(std::io::Error::other(other)),
        })
    }
}

/// Map a send error: unreachable host is run-level, anything else is per-request.
fn request_error(e: reqwest::Error) -> SyncError {
    if e.is_connect() {
        SyncError::Connect(e.to_string())
    } else {
        SyncError::Http(e)
    }
}
