//! In-process stores.
//!
//! Shared across concurrent requests behind a `Mutex`; the lock is held only
//! for the map operation, never across a fetch.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::{CachedData, OptionStore, TtlCache};
use crate::models::TabularDataset;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow!("store lock poisoned"))
}

fn remove_prefixed<V>(map: &mut HashMap<String, V>, prefix: &str) -> usize {
    let before = map.len();
    map.retain(|key, _| !key.starts_with(prefix));
    before - map.len()
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedData<TabularDataset>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let entries = lock(&self.entries)?;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl TtlCache for MemoryCache {
    fn get_entry(&self, key: &str) -> Result<Option<CachedData<TabularDataset>>> {
        let mut entries = lock(&self.entries)?;
        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &TabularDataset, ttl: Duration) -> Result<()> {
        let entry = CachedData::new(value.clone(), ttl.as_secs());
        lock(&self.entries)?.insert(key.to_string(), entry);
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        Ok(remove_prefixed(&mut *lock(&self.entries)?, prefix))
    }
}

#[derive(Default)]
pub struct MemoryOptionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored option.
    pub fn entries(&self) -> Result<BTreeMap<String, String>> {
        Ok(lock(&self.values)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.values)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        Ok(remove_prefixed(&mut *lock(&self.values)?, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> TabularDataset {
        TabularDataset::new(vec!["a".into()], vec![vec!["1".into()]]).unwrap()
    }

    #[test]
    fn test_cache_set_get() {
        let cache = MemoryCache::new();
        assert!(cache.get("k").unwrap().is_none());
        cache.set("k", &dataset(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(dataset()));
    }

    #[test]
    fn test_cache_expired_entry_is_absent() {
        let cache = MemoryCache::new();
        cache.set("k", &dataset(), Duration::ZERO).unwrap();
        assert!(cache.get("k").unwrap().is_none());
        assert!(cache.keys().unwrap().is_empty());
    }

    #[test]
    fn test_delete_by_prefix() {
        let cache = MemoryCache::new();
        cache.set("csvcache_data_1", &dataset(), Duration::from_secs(60)).unwrap();
        cache.set("csvcache_data_2", &dataset(), Duration::from_secs(60)).unwrap();
        cache.set("other", &dataset(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.delete_by_prefix("csvcache_").unwrap(), 2);
        assert_eq!(cache.keys().unwrap(), vec!["other".to_string()]);

        let options = MemoryOptionStore::new();
        options.set("csvcache_last_fetch_1", "10").unwrap();
        options.set("keep", "x").unwrap();
        assert_eq!(options.delete_by_prefix("csvcache_").unwrap(), 1);
        assert_eq!(options.get_or("csvcache_last_fetch_1", "0").unwrap(), "0");
        assert_eq!(options.get("keep").unwrap().as_deref(), Some("x"));
    }
}
