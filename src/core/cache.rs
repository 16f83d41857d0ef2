//! Existence-check cache and the caching store wrapper.

use crate::domain::model::IssueDocument;
use crate::domain::ports::DocumentStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    exists: bool,
    inserted_at: Instant,
}

/// Bounded, time-expiring map of document id -> existence.
///
/// Sits in front of the store's existence check so repeated syncs of the
/// same repository do not re-probe every document. The mutex is only held
/// for map operations, never across an await.
#[derive(Debug)]
pub struct ExistenceCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
}

impl ExistenceCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(id) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.exists),
            Some(_) => {
                entries.remove(id);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, id: &str, exists: bool) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        if !entries.contains_key(id) && entries.len() >= self.max_entries {
            Self::evict_one(&mut entries, self.ttl);
        }
        entries.insert(
            id.to_string(),
            CacheEntry {
                exists,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, id: &str) {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(id);
    }

    pub fn invalidate_batch<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        for id in ids {
            entries.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries; if nothing expired, drop the oldest entry.
    fn evict_one(entries: &mut HashMap<String, CacheEntry>, ttl: Duration) {
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        if entries.len() < before {
            return;
        }
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(id, _)| id.clone())
        {
            entries.remove(&oldest);
        }
    }
}

/// Store wrapper that reads existence checks through an [`ExistenceCache`].
///
/// `save` marks the id present after a successful write; `save_batch`
/// invalidates the batch's entries after a successful commit so the next
/// existence check goes back to the store.
pub struct CachedStore<D> {
    inner: D,
    cache: ExistenceCache,
}

impl<D> CachedStore<D> {
    pub fn new(inner: D, max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ExistenceCache::new(max_entries, ttl),
        }
    }

    pub fn cache(&self) -> &ExistenceCache {
        &self.cache
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

#[async_trait]
impl<D: DocumentStore> DocumentStore for CachedStore<D> {
    async fn exists(&self, id: &str) -> Result<bool> {
        if let Some(hit) = self.cache.get(id) {
            return Ok(hit);
        }
        let exists = self.inner.exists(id).await?;
        self.cache.put(id, exists);
        Ok(exists)
    }

    async fn save(&self, document: &IssueDocument) -> Result<()> {
        self.inner.save(document).await?;
        self.cache.put(&document.id, true);
        Ok(())
    }

    async fn save_batch(&self, documents: &[IssueDocument]) -> Result<()> {
        self.inner.save_batch(documents).await?;
        self.cache
            .invalidate_batch(documents.iter().map(|d| d.id.as_str()));
        Ok(())
    }
}
