//! Snapshot statistics for the tile cache.

use std::fmt;

use serde::Serialize;

use super::bounded::BoundedCacheStats;
use super::types::CostStrategy;

/// Usage and counters of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub cost_strategy: CostStrategy,
    /// Live entries
    pub entries: usize,
    /// Sum of entry costs
    pub usage: u64,
    /// Capacity in cost units
    pub capacity: u64,
    #[serde(flatten)]
    pub counters: BoundedCacheStats,
}

impl TierStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.counters.hits + self.counters.misses;
        if total == 0 {
            0.0
        } else {
            self.counters.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for TierStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.cost_strategy {
            CostStrategy::ByteSize => "bytes",
            CostStrategy::Unitary => "tiles",
        };
        write!(
            f,
            "{} entries, {}/{} {}, {} hits, {} misses, {} evictions",
            self.entries,
            self.usage,
            self.capacity,
            unit,
            self.counters.hits,
            self.counters.misses,
            self.counters.evictions
        )
    }
}

/// Statistics for all three tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileCacheStats {
    pub disk: TierStats,
    pub memory: TierStats,
    pub texture: TierStats,
    /// Tile files deleted because their disk entry was evicted
    pub files_deleted: u64,
    /// Encoded bytes released from the memory tier
    pub memory_bytes_released: u64,
    /// Payloads that failed to decode
    pub decode_errors: u64,
    /// Lookups answered with a non-retriable tile
    pub bogus_hits: u64,
}

impl fmt::Display for TileCacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "disk:    {}", self.disk)?;
        writeln!(f, "memory:  {}", self.memory)?;
        writeln!(f, "texture: {}", self.texture)?;
        write!(
            f,
            "files deleted: {}, memory bytes released: {}, decode errors: {}, bogus hits: {}",
            self.files_deleted, self.memory_bytes_released, self.decode_errors, self.bogus_hits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(hits: u64, misses: u64) -> TierStats {
        TierStats {
            cost_strategy: CostStrategy::Unitary,
            entries: 3,
            usage: 3,
            capacity: 10,
            counters: BoundedCacheStats {
                hits,
                misses,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(tier(0, 0).hit_rate(), 0.0);
        assert!((tier(3, 1).hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cache_stats_display() {
        let stats = TileCacheStats {
            disk: tier(0, 0),
            memory: tier(1, 0),
            texture: tier(2, 0),
            files_deleted: 4,
            memory_bytes_released: 2048,
            decode_errors: 0,
            bogus_hits: 1,
        };
        let display = stats.to_string();
        assert!(display.starts_with("disk:"));
        assert!(display.contains("files deleted: 4"));
        assert!(display.contains("memory bytes released: 2048"));
    }

    #[test]
    fn test_display() {
        let display = tier(2, 1).to_string();
        assert!(display.contains("3 entries"));
        assert!(display.contains("3/10 tiles"));
        assert!(display.contains("2 hits"));
    }
}
