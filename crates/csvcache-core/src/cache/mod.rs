//! Storage collaborators for fetched datasets.
//!
//! Two stores are involved:
//! - a [`TtlCache`] holding the parsed dataset for a day
//! - an [`OptionStore`] holding the last successful fetch time, which never
//!   expires on its own
//!
//! Both are keyed by a URL fingerprint under the [`KEY_PREFIX`] namespace so
//! teardown can remove everything this crate wrote with one prefix delete.
//! In-memory and JSON-file implementations are provided for each.

pub mod entry;
pub mod file;
pub mod memory;

use std::time::Duration;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::models::TabularDataset;

pub use entry::CachedData;
pub use file::{FileCache, FileOptionStore};
pub use memory::{MemoryCache, MemoryOptionStore};

/// Namespace shared by every key this crate writes.
pub const KEY_PREFIX: &str = "csvcache_";

/// Cached datasets live for one day from the write.
pub const CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Deterministic hex fingerprint of a source URL.
pub fn fingerprint(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.trim().as_bytes()))
}

pub fn data_key(fingerprint: &str) -> String {
    format!("{}data_{}", KEY_PREFIX, fingerprint)
}

pub fn last_fetch_key(fingerprint: &str) -> String {
    format!("{}last_fetch_{}", KEY_PREFIX, fingerprint)
}

/// Key-value store whose entries expire after a per-entry TTL.
pub trait TtlCache: Send + Sync {
    /// Entry with its write time, or `None` if absent or expired.
    fn get_entry(&self, key: &str) -> Result<Option<CachedData<TabularDataset>>>;

    fn get(&self, key: &str) -> Result<Option<TabularDataset>> {
        Ok(self.get_entry(key)?.map(|entry| entry.data))
    }

    fn set(&self, key: &str, value: &TabularDataset, ttl: Duration) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`; returns the count.
    fn delete_by_prefix(&self, prefix: &str) -> Result<usize>;
}

/// Persistent string key-value store without expiry.
pub trait OptionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`; returns the count.
    fn delete_by_prefix(&self, prefix: &str) -> Result<usize>;
}
