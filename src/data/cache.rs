//! In-memory caches
//!
//! Volatile and cleared on restart.
//! Uses Moka for concurrent caching.

use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::models::Bookmark;
use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};

const CACHE_NAME: &str = "bookmark_lists";

/// Per-user bookmark listings
///
/// Entries are dropped whenever the owner's bookmarks change. Each
/// invalidation bumps the owner's generation, and a listing loaded under an
/// older generation is never stored.
pub struct BookmarkCache {
    /// User ID -> live bookmarks in insertion order
    lists: Cache<String, Arc<Vec<Bookmark>>>,
    /// User ID -> number of invalidations so far
    generations: Mutex<HashMap<String, u64>>,
}

impl BookmarkCache {
    /// Create new listing cache
    ///
    /// # Arguments
    /// * `max_users` - Maximum number of listings kept
    /// * `ttl` - How long a listing may be served without a reload
    pub fn new(max_users: u64, ttl: Duration) -> Self {
        let lists = Cache::builder()
            .max_capacity(max_users)
            .time_to_live(ttl)
            .build();

        Self {
            lists,
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Current generation of a user's listing
    ///
    /// Read this before loading from the database and pass it to `insert`.
    pub async fn generation(&self, user_id: &str) -> u64 {
        self.generations
            .lock()
            .await
            .get(user_id)
            .copied()
            .unwrap_or_default()
    }

    pub async fn get(&self, user_id: &str) -> Option<Arc<Vec<Bookmark>>> {
        let result = self.lists.get(user_id).await;

        if result.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&[CACHE_NAME]).inc();
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&[CACHE_NAME]).inc();
        }

        result
    }

    /// Store a listing loaded at `generation`
    ///
    /// Skipped when the user was invalidated since. The listing is returned
    /// either way.
    pub async fn insert(
        &self,
        user_id: &str,
        bookmarks: Vec<Bookmark>,
        generation: u64,
    ) -> Arc<Vec<Bookmark>> {
        let list = Arc::new(bookmarks);

        let generations = self.generations.lock().await;
        if generations.get(user_id).copied().unwrap_or_default() == generation {
            self.lists.insert(user_id.to_string(), list.clone()).await;
        } else {
            tracing::debug!(user_id, "Listing changed while loading, not cached");
        }

        list
    }

    pub async fn invalidate(&self, user_id: &str) {
        let mut generations = self.generations.lock().await;
        *generations.entry(user_id.to_string()).or_default() += 1;
        self.lists.invalidate(user_id).await;
    }
}
