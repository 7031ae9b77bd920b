//! Transport capability used to fetch rendered queries from the remote endpoint.
//!
//! The core only depends on [`Transport`]; [`http::HttpTransport`] is the
//! production implementation and [`StaticTransport`] a canned double that
//! records every request it receives.

#[cfg(feature = "http")]
pub mod http;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Fetches a request target and returns the raw response.
///
/// Implementations must not interpret the status code; non-2xx handling is
/// the executor's responsibility.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Performs a blocking fetch of `url`.
    fn fetch(&self, url: &Url) -> Result<Response, TransportError>;
}

/// Status and body of a completed fetch.
#[derive(Clone, Debug)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
}

impl Response {
    /// Builds a `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain a response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client error (connect, TLS, timeout, body read).
    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Transport-specific failure described by a message.
    #[error("{0}")]
    Other(String),
}

/// Transport returning a fixed outcome for every request.
///
/// Requests are recorded so callers can assert how many fetches happened and
/// what they targeted.
#[derive(Debug)]
pub struct StaticTransport {
    outcome: Result<Response, String>,
    calls: AtomicUsize,
    urls: Mutex<Vec<Url>>,
}

impl StaticTransport {
    /// Answers every request with `response`.
    pub fn new(response: Response) -> Self {
        Self {
            outcome: Ok(response),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `200 OK` and `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(Response::ok(body))
    }

    /// Answers every request with `status` and `body`.
    pub fn with_status(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(Response {
            status,
            body: body.into(),
        })
    }

    /// Fails every request with [`TransportError::Other`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Request targets in the order they were fetched.
    pub fn requested_urls(&self) -> Vec<Url> {
        self.urls.lock().clone()
    }
}

impl Transport for StaticTransport {
    fn fetch(&self, url: &Url) -> Result<Response, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.clone());
        match &self.outcome {
            Ok(response) => Ok(response.clone()),
            Err(message) => Err(TransportError::Other(message.clone())),
        }
    }
}
