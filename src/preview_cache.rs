//! Global LRU cache of finished render targets.
//!
//! Re-selecting an asset should not refetch and re-decode its bytes, so
//! completed previews are kept under a byte budget keyed by asset id and
//! the dimension ceiling they were rendered for. Entries larger than the
//! budget are never admitted.

use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::render::RenderTarget;

const CACHE_CAPACITY_BYTES: usize = 128 * 1024 * 1024; // 128 MB upper bound

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct PreviewKey {
    asset_id: i64,
    max_dim: usize,
}

struct CacheEntry {
    target: Arc<RenderTarget>,
    size_bytes: usize,
}

pub struct PreviewCache {
    current_bytes: usize,
    capacity_bytes: usize,
    entries: LruCache<PreviewKey, CacheEntry>,
}

impl PreviewCache {
    fn new(capacity_bytes: usize) -> Self {
        PreviewCache {
            current_bytes: 0,
            capacity_bytes,
            entries: LruCache::unbounded(),
        }
    }

    fn get(&mut self, key: &PreviewKey) -> Option<Arc<RenderTarget>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry.target))
    }

    fn insert(&mut self, key: PreviewKey, target: Arc<RenderTarget>) {
        let size_bytes = target.byte_len();
        if size_bytes > self.capacity_bytes {
            return;
        }

        if let Some(old) = self.entries.pop(&key) {
            self.current_bytes = self.current_bytes.saturating_sub(old.size_bytes);
        }

        while self.current_bytes + size_bytes > self.capacity_bytes {
            if let Some((_key, entry)) = self.entries.pop_lru() {
                self.current_bytes = self.current_bytes.saturating_sub(entry.size_bytes);
            } else {
                break;
            }
        }

        self.current_bytes = self.current_bytes.saturating_add(size_bytes);
        self.entries.put(key, CacheEntry { target, size_bytes });
    }

    fn remove(&mut self, asset_id: i64) {
        let stale: Vec<PreviewKey> = self
            .entries
            .iter()
            .map(|(k, _)| *k)
            .filter(|k| k.asset_id == asset_id)
            .collect();
        for key in stale {
            if let Some(entry) = self.entries.pop(&key) {
                self.current_bytes = self.current_bytes.saturating_sub(entry.size_bytes);
            }
        }
    }
}

static PREVIEW_CACHE: std::sync::LazyLock<Mutex<PreviewCache>> =
    std::sync::LazyLock::new(|| Mutex::new(PreviewCache::new(CACHE_CAPACITY_BYTES)));

pub fn get(asset_id: i64, max_dim: usize) -> Option<Arc<RenderTarget>> {
    let key = PreviewKey { asset_id, max_dim };
    PREVIEW_CACHE.lock().unwrap().get(&key)
}

pub fn insert(asset_id: i64, max_dim: usize, target: Arc<RenderTarget>) {
    let key = PreviewKey { asset_id, max_dim };
    PREVIEW_CACHE.lock().unwrap().insert(key, target);
}

/// Drop all cached renditions of an asset, e.g. after its file was
/// reprocessed upstream.
pub fn invalidate(asset_id: i64) {
    PREVIEW_CACHE.lock().unwrap().remove(asset_id);
}
