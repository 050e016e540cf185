//! Self-update check.
//!
//! Fetches a small JSON manifest and reports whether it names a newer
//! release. Both the manifest and the download it points at must be https
//! URLs that pass the SSRF guard, or the update is ignored.

use std::cmp::Ordering;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::CsvCacheError;
use crate::fetch::{HttpFetch, REQUEST_TIMEOUT};
use crate::security::validate_url;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    pub download_url: String,
    /// Release notes and anything else the manifest carries.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub current: String,
    pub latest: String,
    pub download_url: String,
}

/// Dotted numeric version, with an optional leading `v`.
fn parse_version(version: &str) -> Option<Vec<u64>> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return None;
    }
    trimmed.split('.').map(|part| part.parse().ok()).collect()
}

/// True if `candidate` is a strictly higher version than `current`.
/// Missing trailing segments count as zero, so `1.2` equals `1.2.0`.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    let (Some(mut a), Some(mut b)) = (parse_version(candidate), parse_version(current)) else {
        return false;
    };
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    a.cmp(&b) == Ordering::Greater
}

async fn validate_https(raw: &str) -> Result<url::Url, CsvCacheError> {
    let url = validate_url(raw).await?;
    if url.scheme() != "https" {
        warn!(url = %url, "Update URL is not https");
        return Err(CsvCacheError::UnsafeUrl);
    }
    Ok(url)
}

/// Look for a release newer than `current` at `manifest_url`.
pub async fn check_for_update<F: HttpFetch>(
    fetcher: &F,
    manifest_url: &str,
    current: &str,
) -> Result<Option<UpdateInfo>, CsvCacheError> {
    let url = validate_https(manifest_url).await?;

    let response = fetcher.get(&url, REQUEST_TIMEOUT).await.map_err(|e| {
        warn!(url = %url, error = %e, "Update manifest fetch failed");
        CsvCacheError::FetchError
    })?;
    if !response.is_success() {
        warn!(url = %url, status = response.status, "Update manifest returned an error status");
        return Err(CsvCacheError::FetchError);
    }

    let manifest: UpdateManifest = serde_json::from_str(&response.body).map_err(|e| {
        warn!(url = %url, error = %e, "Update manifest is not valid");
        CsvCacheError::FetchError
    })?;

    if !is_newer(&manifest.version, current) {
        debug!(latest = %manifest.version, current, "No newer release");
        return Ok(None);
    }

    let download = validate_https(&manifest.download_url).await?;
    info!(latest = %manifest.version, current, "Update available");
    Ok(Some(UpdateInfo {
        current: current.to_string(),
        latest: manifest.version,
        download_url: download.to_string(),
    }))
}
