// Explicit cache of processed summaries, owned by the caller.

use std::collections::VecDeque;

use log::debug;

/// Identifies a source by a label and the SHA-256 digest of its raw content, so that a
/// file edited in place is not served from the cache.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct SourceId {
    pub label: String,
    pub digest: String,
}

impl SourceId {
    pub fn new(label: &str, content: &str) -> SourceId {
        SourceId {
            label: label.to_string(),
            digest: sha256::digest(content),
        }
    }
}

/// A bounded cache holding at least one entry. When full, the oldest entry is evicted
/// first.
pub struct SummaryCache<T> {
    capacity: usize,
    entries: VecDeque<(SourceId, T)>,
}

impl<T> SummaryCache<T> {
    pub const DEFAULT_CAPACITY: usize = 4;

    pub fn new(capacity: usize) -> SummaryCache<T> {
        let capacity = capacity.max(1);
        SummaryCache {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &SourceId) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn insert(&mut self, id: SourceId, value: T) {
        self.entries.retain(|(k, _)| *k != id);
        while self.entries.len() >= self.capacity {
            if let Some((old, _)) = self.entries.pop_front() {
                debug!("SummaryCache: evicting {}", old.label);
            }
        }
        self.entries.push_back((id, value));
    }

    /// Returns the cached value, or computes and stores it. A failed computation leaves
    /// the cache unchanged.
    pub fn get_or_try_insert_with<E, F>(&mut self, id: &SourceId, f: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let idx = match self.entries.iter().position(|(k, _)| k == id) {
            Some(idx) => {
                debug!("SummaryCache: hit for {}", id.label);
                idx
            }
            None => {
                let value = f()?;
                self.insert(id.clone(), value);
                self.entries.len() - 1
            }
        };
        Ok(&self.entries[idx].1)
    }
}

impl<T> Default for SummaryCache<T> {
    fn default() -> Self {
        SummaryCache::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_content() {
        let a = SourceId::new("2020", "[1, 2]");
        let b = SourceId::new("2020", "[1, 2, 3]");
        assert_ne!(a, b);
        assert_eq!(a, SourceId::new("2020", "[1, 2]"));
        assert_eq!(a.digest.len(), 64);
    }

    #[test]
    fn oldest_entry_is_evicted() {
        let mut cache: SummaryCache<u32> = SummaryCache::new(2);
        cache.insert(SourceId::new("a", "a"), 1);
        cache.insert(SourceId::new("b", "b"), 2);
        cache.insert(SourceId::new("c", "c"), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&SourceId::new("a", "a")), None);
        assert_eq!(cache.get(&SourceId::new("c", "c")), Some(&3));
    }

    #[test]
    fn computes_once() {
        let mut cache: SummaryCache<String> = SummaryCache::default();
        let id = SourceId::new("x", "content");
        let mut calls = 0;
        for _ in 0..3 {
            let v: Result<&String, ()> = cache.get_or_try_insert_with(&id, || {
                calls += 1;
                Ok("value".to_string())
            });
            assert_eq!(v.unwrap(), "value");
        }
        assert_eq!(calls, 1);
        let failed: Result<&String, &str> =
            cache.get_or_try_insert_with(&SourceId::new("y", ""), || Err("boom"));
        assert_eq!(failed, Err("boom"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_keeps_the_last_entry() {
        let mut cache: SummaryCache<u8> = SummaryCache::new(0);
        cache.insert(SourceId::new("a", "a"), 1);
        cache.insert(SourceId::new("b", "b"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&SourceId::new("b", "b")), Some(&2));
    }
}
