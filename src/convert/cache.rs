//! In-memory cache of resolved transforms
//!
//! Memoizes `(from, to) -> Affine` pairs so repeated conversions skip
//! graph resolution. Entries are directional: the reverse pair is
//! computed and cached independently the first time it's requested.
//!
//! Invalidation is wholesale - any unit or edge mutation drops every
//! entry. Catalog edits are rare administrative actions relative to
//! conversion reads, so correctness wins over hit-rate here. The
//! cache is owned by the service's dependency graph, not a global.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::catalog::unit::UnitCode;
use crate::convert::transform::Affine;

/// Cache statistics for `metron cache stats`
#[derive(Debug, Default, Clone)]
pub struct TransformCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub resets: u64,
}

/// Memoized resolved transforms, keyed by normalized code pair
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: RwLock<HashMap<(UnitCode, UnitCode), Affine>>,
    hits: AtomicU64,
    misses: AtomicU64,
    resets: AtomicU64,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolved transform
    pub fn get(&self, from: &UnitCode, to: &UnitCode) -> Option<Affine> {
        let entries = self.entries.read().expect("transform cache lock poisoned");
        let hit = entries.get(&(from.clone(), to.clone())).copied();
        match hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Store a resolved transform for one direction
    pub fn put(&self, from: &UnitCode, to: &UnitCode, transform: Affine) {
        let mut entries = self.entries.write().expect("transform cache lock poisoned");
        entries.insert((from.clone(), to.clone()), transform);
    }

    /// Unconditionally drop all entries
    pub fn reset(&self) {
        let mut entries = self.entries.write().expect("transform cache lock poisoned");
        entries.clear();
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("transform cache lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TransformCacheStats {
        TransformCacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> UnitCode {
        UnitCode::new(s).unwrap()
    }

    #[test]
    fn test_put_get() {
        let cache = TransformCache::new();
        let t = Affine::scale(dec!(0.01));

        assert!(cache.get(&code("cm"), &code("m")).is_none());
        cache.put(&code("cm"), &code("m"), t);
        assert_eq!(cache.get(&code("cm"), &code("m")), Some(t));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_directions_are_independent() {
        let cache = TransformCache::new();
        cache.put(&code("cm"), &code("m"), Affine::scale(dec!(0.01)));
        assert!(cache.get(&code("m"), &code("cm")).is_none());
    }

    #[test]
    fn test_reset_drops_everything() {
        let cache = TransformCache::new();
        cache.put(&code("cm"), &code("m"), Affine::scale(dec!(0.01)));
        cache.put(&code("g"), &code("kg"), Affine::scale(dec!(0.001)));
        assert_eq!(cache.len(), 2);

        cache.reset();
        assert!(cache.is_empty());
        assert!(cache.get(&code("cm"), &code("m")).is_none());
    }

    #[test]
    fn test_stats_counters() {
        let cache = TransformCache::new();
        cache.get(&code("cm"), &code("m")); // miss
        cache.put(&code("cm"), &code("m"), Affine::scale(dec!(0.01)));
        cache.get(&code("cm"), &code("m")); // hit
        cache.reset();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.resets, 1);
        assert_eq!(stats.entries, 0);
    }
}
