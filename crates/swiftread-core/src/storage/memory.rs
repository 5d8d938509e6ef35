use std::{cell::Cell, collections::BTreeMap};

use super::{LargeStore, SmallStore, StoreError};

/// In-memory backend usable as either tier.
///
/// An optional byte quota (keys plus values) makes writes fail the way a
/// full browser store does, and reads are counted so callers can check which
/// tier was consulted.
#[derive(Debug)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    available: bool,
    reads: Cell<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: None,
            available: true,
            reads: Cell::new(0),
            writes: 0,
        }
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Store whose every operation fails with [`StoreError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Number of `get`/`has` calls served so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Number of successful `put` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    fn put_entry(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .entries
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_owned(), value.to_owned());
        self.writes += 1;
        Ok(())
    }

    fn get_entry(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.set(self.reads.get() + 1);
        self.check_available()?;
        Ok(self.entries.get(key).cloned())
    }

    fn has_entry(&self, key: &str) -> Result<bool, StoreError> {
        self.reads.set(self.reads.get() + 1);
        self.check_available()?;
        Ok(self.entries.contains_key(key))
    }

    fn delete_entry(&mut self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries.remove(key);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SmallStore for MemoryStore {
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put_entry(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_entry(key)
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.has_entry(key)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.delete_entry(key)
    }
}

impl LargeStore for MemoryStore {
    async fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put_entry(key, value)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.get_entry(key)
    }

    async fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.has_entry(key)
    }

    async fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.delete_entry(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_counts_keys_and_values() {
        let mut store = MemoryStore::with_quota(10);

        assert_eq!(SmallStore::put(&mut store, "k", "123456789"), Ok(()));
        assert_eq!(
            SmallStore::put(&mut store, "j", "1"),
            Err(StoreError::QuotaExceeded)
        );
        // replacing a value only needs room for the difference
        assert_eq!(SmallStore::put(&mut store, "k", "12345678"), Ok(()));
        assert_eq!(store.used_bytes(), 9);
    }

    #[test]
    fn unavailable_store_fails_everything() {
        let mut store = MemoryStore::unavailable();

        assert_eq!(
            SmallStore::put(&mut store, "k", "v"),
            Err(StoreError::Unavailable)
        );
        assert_eq!(SmallStore::get(&store, "k"), Err(StoreError::Unavailable));
        assert_eq!(SmallStore::delete(&mut store, "k"), Err(StoreError::Unavailable));
        assert_eq!(store.reads(), 1);
    }

    #[test]
    fn deleting_missing_key_is_fine() {
        let mut store = MemoryStore::new();

        assert_eq!(SmallStore::delete(&mut store, "nothing"), Ok(()));
        assert_eq!(SmallStore::has(&store, "nothing"), Ok(false));
    }
}
