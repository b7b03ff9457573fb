//! Bounded cache of webview details across discovery runs.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use wvscout_core::WebviewDetails;

/// LRU map from `"<device>:<context>"` to the last known details.
///
/// Shared between the resolver, which writes it, and capability composition,
/// which reads it. Thread-safe.
pub struct DetailsCache {
    inner: Mutex<LruCache<String, WebviewDetails>>,
}

impl DetailsCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Capacity from config; zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
    }

    /// Cache key for a context on a device.
    pub fn key(device_id: Option<&str>, webview_name: &str) -> String {
        format!("{}:{webview_name}", device_id.unwrap_or_default())
    }

    /// Look up details, marking the entry most recently used.
    pub fn get(&self, key: &str) -> Option<WebviewDetails> {
        self.inner.lock().get(key).cloned()
    }

    pub fn set(&self, key: String, details: WebviewDetails) {
        self.inner.lock().put(key, details);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().pop(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DetailsCache {
    fn default() -> Self {
        Self::with_capacity(100)
    }
}
