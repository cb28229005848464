//! Cache statistics for a memoization context.

use serde::{Deserialize, Serialize};

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that executed the wrapped function
    pub misses: u64,
}

impl RecallStats {
    /// Create zeroed stats
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Record a cache miss
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Total lookups
    #[must_use]
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Get hit rate (0.0 - 1.0)
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        if self.lookups() == 0 {
            return 0.0;
        }
        self.hits as f64 / self.lookups() as f64
    }

    /// Reset counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
