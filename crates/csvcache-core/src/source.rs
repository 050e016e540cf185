//! Fetch-cache orchestrator.
//!
//! [`DataSource::load`] serves the cached dataset for a URL until the daily
//! refresh window opens, then fetches and parses once, and records the
//! fetch so the rest of the day is served from cache again.
//!
//! Concurrent loads of the same URL may both see a refresh as due and both
//! fetch. The last write wins; no lock spans the fetch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::{self, OptionStore, TtlCache, CACHE_TTL, KEY_PREFIX};
use crate::csv::{parse_csv, MAX_ROWS};
use crate::error::CsvCacheError;
use crate::fetch::{truncate_body, HttpFetch, REQUEST_TIMEOUT};
use crate::freshness::{from_unix_secs, FreshnessWindow};
use crate::models::TabularDataset;
use crate::security::{check_shape, validate_url};

/// Cache state of one source URL, for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub fingerprint: String,
    pub cached_rows: Option<usize>,
    pub cached_age: Option<String>,
    pub last_fetch: Option<DateTime<Utc>>,
    pub refresh_due: bool,
    pub next_refresh: DateTime<Utc>,
}

pub struct DataSource<F, C, S> {
    fetcher: F,
    cache: C,
    options: S,
    window: FreshnessWindow,
    max_rows: usize,
    timeout: Duration,
}

impl<F, C, S> DataSource<F, C, S>
where
    F: HttpFetch,
    C: TtlCache,
    S: OptionStore,
{
    pub fn new(fetcher: F, cache: C, options: S) -> Self {
        Self {
            fetcher,
            cache,
            options,
            window: FreshnessWindow::default(),
            max_rows: MAX_ROWS,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_window(mut self, window: FreshnessWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn options(&self) -> &S {
        &self.options
    }

    /// Produce the dataset for `raw_url` as of `now`.
    pub async fn load(
        &self,
        raw_url: &str,
        now: DateTime<Utc>,
    ) -> Result<TabularDataset, CsvCacheError> {
        let url = validate_url(raw_url).await?;
        let fingerprint = cache::fingerprint(url.as_str());
        let data_key = cache::data_key(&fingerprint);
        let last_fetch_key = cache::last_fetch_key(&fingerprint);

        let last_fetch = self.last_fetch(&last_fetch_key)?;
        let refresh_due = self.window.should_refresh(now, last_fetch)?;

        if !refresh_due {
            match self.cache.get(&data_key) {
                Ok(Some(dataset)) => {
                    debug!(fingerprint = %fingerprint, rows = dataset.len(), "Cache hit");
                    return Ok(dataset);
                }
                Ok(None) => debug!(fingerprint = %fingerprint, "Cache miss"),
                Err(e) => {
                    warn!(fingerprint = %fingerprint, error = %e, "Cache read failed, treating as miss")
                }
            }
        } else {
            debug!(fingerprint = %fingerprint, "Refresh window open");
        }

        let response = match self.fetcher.get(&url, self.timeout).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "CSV fetch failed");
                return Err(CsvCacheError::FetchError);
            }
        };
        if !response.is_success() {
            warn!(
                url = %url,
                status = response.status,
                body = %truncate_body(&response.body),
                "CSV source returned an error status"
            );
            return Err(CsvCacheError::FetchError);
        }
        if response.body.trim().is_empty() {
            warn!(url = %url, "CSV source returned an empty body");
            return Err(CsvCacheError::EmptyBody);
        }

        let dataset = parse_csv(&response.body, self.max_rows).map_err(|e| {
            warn!(url = %url, "CSV body could not be parsed");
            e
        })?;

        match self.cache.set(&data_key, &dataset, CACHE_TTL) {
            Ok(()) => {
                if let Err(e) = self.options.set(&last_fetch_key, &now.timestamp().to_string()) {
                    warn!(fingerprint = %fingerprint, error = %e, "Failed to record fetch time");
                }
            }
            // leaving the fetch time unchanged makes the next call retry
            Err(e) => warn!(fingerprint = %fingerprint, error = %e, "Failed to cache dataset"),
        }

        info!(url = %url, rows = dataset.len(), columns = dataset.width(), "Refreshed CSV source");
        Ok(dataset)
    }

    fn last_fetch(&self, key: &str) -> Result<Option<DateTime<Utc>>, CsvCacheError> {
        let stored = self.options.get(key).map_err(|e| {
            warn!(key = key, error = %e, "Failed to read last fetch time");
            CsvCacheError::time("last fetch record unavailable")
        })?;

        match stored {
            None => Ok(None),
            Some(value) => {
                let secs: i64 = value.trim().parse().map_err(|_| {
                    CsvCacheError::time(format!("corrupt last fetch record {:?}", value))
                })?;
                // 0 is what a never-fetched store hands back
                if secs == 0 {
                    Ok(None)
                } else {
                    from_unix_secs(secs).map(Some)
                }
            }
        }
    }

    /// Cache and freshness state for `raw_url` without fetching.
    pub fn status(&self, raw_url: &str, now: DateTime<Utc>) -> Result<SourceStatus, CsvCacheError> {
        let fingerprint = match check_shape(raw_url) {
            Ok((url, _)) => cache::fingerprint(url.as_str()),
            Err(_) => cache::fingerprint(raw_url),
        };
        let last_fetch = self.last_fetch(&cache::last_fetch_key(&fingerprint))?;
        let entry = self
            .cache
            .get_entry(&cache::data_key(&fingerprint))
            .unwrap_or_else(|e| {
                warn!(fingerprint = %fingerprint, error = %e, "Cache read failed");
                None
            });

        Ok(SourceStatus {
            cached_rows: entry.as_ref().map(|e| e.data.len()),
            cached_age: entry.as_ref().map(|e| e.age_display()),
            last_fetch,
            refresh_due: self.window.should_refresh(now, last_fetch)?,
            next_refresh: self.window.next_refresh_after(now)?,
            fingerprint,
        })
    }

    /// Delete every cache entry and fetch record this crate has written.
    pub fn teardown(&self) -> anyhow::Result<usize> {
        let cached = self.cache.delete_by_prefix(KEY_PREFIX)?;
        let records = self.options.delete_by_prefix(KEY_PREFIX)?;
        info!(cached, records, "Removed csvcache entries");
        Ok(cached + records)
    }
}
