//! reqwest-backed [`HttpFetch`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use tracing::debug;
use url::Url;

use super::{HttpFetch, HttpResponse, TransportError};

/// Default request timeout in seconds.
/// Sources are small CSV files; a stuck upstream must not hold the page.
pub const REQUEST_TIMEOUT_SECS: u64 = 20;

const USER_AGENT: &str = concat!("csvcache/", env!("CARGO_PKG_VERSION"));

/// HTTP client for CSV sources.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Create a new fetcher.
    ///
    /// Redirects are not followed: the target was vetted by the URL guard and
    /// a redirect could point anywhere.
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "text/csv, text/plain;q=0.9, */*;q=0.1")
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url = %url, status, bytes = body.len(), "Fetched CSV source");

        Ok(HttpResponse { status, body })
    }
}
