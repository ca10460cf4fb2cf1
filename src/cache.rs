use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::RwLock;

use crate::{data::RankingItem, genre::Genre};

/// How long a loaded ranking stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Accumulated pages of one genre
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFeed {
    pub items: Vec<RankingItem>,
    pub current_page: u32,
    pub has_more: bool,
    pub total_count: u64,
}

#[derive(Debug)]
struct Entry {
    feed: CachedFeed,
    stored_at: Instant,
}

/// Per-genre store shared by feeds, populated on fetch and invalidated on refresh
#[derive(Debug)]
pub struct RankingCache {
    ttl: Duration,
    entries: RwLock<HashMap<Genre, Entry>>,
}

impl Default for RankingCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl RankingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `genre`. Expired entries are evicted.
    pub fn get(&self, genre: Genre) -> Option<CachedFeed> {
        {
            let entries = self.entries.read();
            match entries.get(&genre) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.feed.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.evict_expired(genre)
    }

    /// Freshness checked again under the write lock. A `put` may have landed after the read.
    fn evict_expired(&self, genre: Genre) -> Option<CachedFeed> {
        let mut entries = self.entries.write();
        match entries.get(&genre) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.feed.clone()),
            Some(_) => {
                tracing::debug!(%genre, "evicting expired ranking cache entry");
                entries.remove(&genre);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, genre: Genre, feed: CachedFeed) {
        self.entries.write().insert(
            genre,
            Entry {
                feed,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, genre: Genre) {
        if self.entries.write().remove(&genre).is_some() {
            tracing::debug!(%genre, "invalidated ranking cache entry");
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
