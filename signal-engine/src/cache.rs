use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Slot<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Slot<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Concurrent string-keyed cache whose entries expire after a TTL
pub struct TtlCache<V> {
    slots: DashMap<String, Slot<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`. An expired entry is dropped on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let slot = self.slots.get(key)?;
        if slot.is_live(Instant::now()) {
            return Some(slot.value.clone());
        }
        drop(slot);
        self.slots.remove(key);
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_with_ttl(key, value, self.ttl);
    }

    pub fn insert_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.slots.insert(
            key.into(),
            Slot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Cached value for `key`, or the result of `compute` stored under it.
    /// Errors are returned as-is and nothing is cached.
    pub fn get_or_try_insert_with<E, F>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) -> Option<V> {
        self.slots.remove(key).map(|(_, slot)| slot.value)
    }

    /// Drop every entry whose key starts with `prefix`; returns how many went.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.slots.len();
        self.slots.retain(|key, _| !key.starts_with(prefix));
        before.saturating_sub(self.slots.len())
    }

    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.slots.retain(|_, slot| slot.is_live(now));
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Entry count, expired entries included until purged
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
