use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::search::SearchPageData;

/// Process-wide store of search results keyed by opaque id, with per-entry TTL.
///
/// A read may race the scheduled eviction; the loser simply observes a miss.
#[derive(Clone, Default)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, SearchPageData>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<SearchPageData> {
        self.entries.read().get(key).cloned()
    }

    /// Stores `val` and schedules its eviction after `ttl`.
    pub fn set(&self, key: String, val: SearchPageData, ttl: Duration) {
        self.entries.write().insert(key.clone(), val);
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            entries.write().remove(&key);
        });
    }
}
