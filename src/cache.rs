// src/cache.rs
//! Research cache: last data bundle per company, keyed by lowercased name.
//! Last write wins; no TTL, no eviction.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::fetch::ResearchData;

pub fn cache_key(company: &str) -> String {
    company.trim().to_lowercase()
}

pub trait ResearchStore: Send + Sync {
    /// Insert or overwrite the entry for `company` (key normalized by the store).
    fn put(&self, company: &str, data: ResearchData);
    fn get(&self, company: &str) -> Option<ResearchData>;
    fn keys(&self) -> Vec<String>;

    /// Cached company mentioned in `message`: the longest key that occurs in the
    /// lowercased message, ties broken alphabetically. Returns `(key, data)`.
    fn find_mentioned(&self, message: &str) -> Option<(String, ResearchData)> {
        let haystack = message.to_lowercase();
        let key = self
            .keys()
            .into_iter()
            .filter(|k| !k.is_empty() && haystack.contains(k.as_str()))
            .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))?;
        let data = self.get(&key)?;
        Some((key, data))
    }
}

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<HashMap<String, ResearchData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResearchStore for InMemoryStore {
    fn put(&self, company: &str, data: ResearchData) {
        // Entries are whole values, so a poisoned lock still holds consistent data.
        let mut m = match self.inner.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        m.insert(cache_key(company), data);
    }

    fn get(&self, company: &str) -> Option<ResearchData> {
        let m = match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        m.get(&cache_key(company)).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let m = match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        m.keys().cloned().collect()
    }
}
