
use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::retriever::ScoredChunk;

/// Counters describing cache behaviour since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate as a percentage
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    k: usize,
}

/// Bounded least-recently-used map from (query, k) to ranked results
#[derive(Debug)]
pub struct RetrievalCache {
    entries: LruCache<CacheKey, Vec<ScoredChunk>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl RetrievalCache {
    #[inline]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a cached result, refreshing its recency on a hit
    #[inline]
    pub fn get(&mut self, query: &str, k: usize) -> Option<Vec<ScoredChunk>> {
        let key = CacheKey {
            query: query.to_string(),
            k,
        };
        match self.entries.get(&key) {
            Some(results) => {
                self.hits += 1;
                Some(results.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    #[inline]
    pub fn insert(&mut self, query: &str, k: usize, results: Vec<ScoredChunk>) {
        let key = CacheKey {
            query: query.to_string(),
            k,
        };
        // `push` also hands back the old value when the key was already present
        if let Some((evicted, _)) = self.entries.push(key.clone(), results) {
            if evicted != key {
                self.evictions += 1;
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, query: &str, k: usize) -> bool {
        self.entries.contains(&CacheKey {
            query: query.to_string(),
            k,
        })
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            len: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}
