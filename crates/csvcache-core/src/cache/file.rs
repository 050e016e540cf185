//! JSON-file stores for use across process runs.
//!
//! `FileCache` writes one `<key>.json` file per entry into a cache directory.
//! `FileOptionStore` keeps all options in a single JSON object file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use super::{CachedData, OptionStore, TtlCache};
use crate::models::TabularDataset;

/// Keys become file names, so only a conservative character set is allowed.
fn check_key(key: &str) -> Result<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("invalid store key: {:?}", key);
    }
    Ok(())
}

pub struct FileCache {
    cache_dir: PathBuf,
}

impl FileCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Keys of every entry file on disk, sorted. Expired entries are included
    /// until a read removes them.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl TtlCache for FileCache {
    fn get_entry(&self, key: &str) -> Result<Option<CachedData<TabularDataset>>> {
        check_key(key)?;
        let path = self.cache_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))?;
        let cached: CachedData<TabularDataset> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", key))?;

        if cached.is_expired() {
            debug!(cache = key, "Removing expired cache entry");
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove expired cache file: {}", key))?;
            return Ok(None);
        }

        Ok(Some(cached))
    }

    fn set(&self, key: &str, value: &TabularDataset, ttl: Duration) -> Result<()> {
        check_key(key)?;
        let cached = CachedData::new(value, ttl.as_secs());
        let contents = serde_json::to_string(&cached)?;
        // write-then-rename so readers never see a partial file
        let tmp = self.cache_dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        std::fs::rename(&tmp, self.cache_path(key))
            .with_context(|| format!("Failed to move cache file into place: {}", key))?;
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let mut deleted = 0;
        for key in self.keys()? {
            if key.starts_with(prefix) {
                std::fs::remove_file(self.cache_path(&key))
                    .with_context(|| format!("Failed to delete cache file: {}", key))?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

pub struct FileOptionStore {
    path: PathBuf,
    // serialises read-modify-write within this process
    guard: Mutex<()>,
}

impl FileOptionStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every stored option.
    pub fn entries(&self) -> Result<BTreeMap<String, String>> {
        self.load()
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read options file: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse options file: {}", self.path.display()))
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write options file: {}", self.path.display()))
    }

    fn locked<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| anyhow!("options lock poisoned"))?;
        f()
    }
}

impl OptionStore for FileOptionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.locked(|| Ok(self.load()?.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.locked(|| {
            let mut values = self.load()?;
            values.insert(key.to_string(), value.to_string());
            self.save(&values)
        })
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        self.locked(|| {
            let mut values = self.load()?;
            let before = values.len();
            values.retain(|key, _| !key.starts_with(prefix));
            let deleted = before - values.len();
            if deleted > 0 {
                self.save(&values)?;
            }
            Ok(deleted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> TabularDataset {
        TabularDataset::new(
            vec!["date".into(), "v".into()],
            vec![vec!["2024-01-01".into(), "1".into()]],
        )
        .unwrap()
    }

    #[test]
    fn test_file_cache_roundtrip_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache")).unwrap();

        cache.set("csvcache_data_a", &dataset(), Duration::from_secs(60)).unwrap();
        let entry = cache.get_entry("csvcache_data_a").unwrap().unwrap();
        assert_eq!(entry.data, dataset());
        assert_eq!(entry.ttl_secs, 60);

        cache.set("csvcache_data_b", &dataset(), Duration::ZERO).unwrap();
        assert!(cache.get("csvcache_data_b").unwrap().is_none());
        assert_eq!(cache.keys().unwrap(), vec!["csvcache_data_a".to_string()]);
    }

    #[test]
    fn test_file_cache_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf()).unwrap();
        assert!(cache.get("../escape").is_err());
        assert!(cache.set("a/b", &dataset(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_file_cache_corrupt_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("csvcache_data_x.json"), "{not json").unwrap();
        assert!(cache.get("csvcache_data_x").is_err());
    }

    #[test]
    fn test_file_cache_delete_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().to_path_buf()).unwrap();
        cache.set("csvcache_data_a", &dataset(), Duration::from_secs(60)).unwrap();
        cache.set("keep", &dataset(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.delete_by_prefix("csvcache_").unwrap(), 1);
        assert_eq!(cache.keys().unwrap(), vec!["keep".to_string()]);
    }

    #[test]
    fn test_file_option_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileOptionStore::new(dir.path().join("opts").join("options.json")).unwrap();
        assert_eq!(store.get_or("csvcache_last_fetch_a", "0").unwrap(), "0");

        store.set("csvcache_last_fetch_a", "1700000000").unwrap();
        store.set("other", "x").unwrap();

        let reopened = FileOptionStore::new(store.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("csvcache_last_fetch_a").unwrap().as_deref(),
            Some("1700000000")
        );
        assert_eq!(reopened.delete_by_prefix("csvcache_").unwrap(), 1);
        assert_eq!(reopened.entries().unwrap().len(), 1);
    }
}
