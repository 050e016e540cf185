//! HTTP fetch capability.
//!
//! The orchestrator only sees the [`HttpFetch`] trait so tests can count
//! and script requests. [`ReqwestFetcher`] is the production implementation.

pub mod client;
pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

pub use client::{ReqwestFetcher, REQUEST_TIMEOUT_SECS};
pub use error::{truncate_body, TransportError};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(REQUEST_TIMEOUT_SECS);

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// GET `url`, failing with [`TransportError::Timeout`] after `timeout`.
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TransportError>;
}
