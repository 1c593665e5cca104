use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::FeedId;
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CachedFeed {
    id: FeedId,
    stored_at: DateTime<Utc>,
}

/// Symbol → feed id memo owned by the feed resolver.
///
/// Without a TTL an entry never changes once written. With a TTL, an expired
/// entry reads as a miss and may be replaced on the next resolution.
pub struct FeedIdCache {
    entries: Mutex<HashMap<String, CachedFeed>>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
}

impl FeedIdCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            ttl: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn get(&self, key: &str) -> Option<FeedId> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let cached = entries
            .get(key)
            .map(|entry| (entry.id.clone(), self.is_expired(entry, now)));
        match cached {
            Some((id, false)) => Some(id),
            Some((_, true)) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `id` under `key` unless a live entry already exists.
    ///
    /// Returns the id the key maps to afterwards.
    pub fn insert(&self, key: impl Into<String>, id: FeedId) -> FeedId {
        let now = self.clock.now();
        let mut entries = self.lock();
        let key = key.into();

        if let Some(existing) = entries.get(&key) {
            if !self.is_expired(existing, now) {
                return existing.id.clone();
            }
        }

        entries.insert(
            key,
            CachedFeed {
                id: id.clone(),
                stored_at: now,
            },
        );
        id
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &CachedFeed, now: DateTime<Utc>) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - entry.stored_at >= ttl,
            Err(_) => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedFeed>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FeedIdCache {
    fn default() -> Self {
        Self::new()
    }
}
