//! Small value types shared by the cache tiers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// How a tier measures the cost of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStrategy {
    /// Cost is the entry size in bytes.
    #[default]
    ByteSize,
    /// Every entry costs 1; capacity is an entry count.
    Unitary,
}

impl CostStrategy {
    /// Cost of an entry of `bytes` bytes under this strategy.
    pub fn cost(self, bytes: u64) -> u64 {
        match self {
            CostStrategy::ByteSize => bytes,
            CostStrategy::Unitary => 1,
        }
    }
}

impl fmt::Display for CostStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostStrategy::ByteSize => write!(f, "bytesize"),
            CostStrategy::Unitary => write!(f, "unitary"),
        }
    }
}

impl FromStr for CostStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bytesize" | "byte_size" | "bytes" => Ok(CostStrategy::ByteSize),
            "unitary" | "unit" | "count" => Ok(CostStrategy::Unitary),
            other => Err(format!("unknown cost strategy '{}'", other)),
        }
    }
}

bitflags::bitflags! {
    /// Tiers an insert should populate.
    ///
    /// The texture tier is never populated by inserts, only by promotion
    /// on lookup.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CacheAreas: u32 {
        /// Persist the tile as a file
        const DISK = 0x01;

        /// Keep the encoded bytes in RAM
        const MEMORY = 0x02;

        /// Both tiers
        const ALL = Self::DISK.bits() | Self::MEMORY.bits();
    }
}

impl Default for CacheAreas {
    fn default() -> Self {
        CacheAreas::ALL
    }
}

impl FromStr for CacheAreas {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disk" => Ok(CacheAreas::DISK),
            "memory" => Ok(CacheAreas::MEMORY),
            "all" => Ok(CacheAreas::ALL),
            other => Err(format!("unknown cache area '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_strategy_cost() {
        assert_eq!(CostStrategy::ByteSize.cost(4096), 4096);
        assert_eq!(CostStrategy::Unitary.cost(4096), 1);
    }

    #[test]
    fn test_cost_strategy_parse() {
        assert_eq!("ByteSize".parse(), Ok(CostStrategy::ByteSize));
        assert_eq!("unitary".parse(), Ok(CostStrategy::Unitary));
        assert!("weighted".parse::<CostStrategy>().is_err());
    }

    #[test]
    fn test_cost_strategy_display_round_trips() {
        for strategy in [CostStrategy::ByteSize, CostStrategy::Unitary] {
            assert_eq!(strategy.to_string().parse(), Ok(strategy));
        }
    }

    #[test]
    fn test_cache_areas() {
        assert!(CacheAreas::ALL.contains(CacheAreas::DISK));
        assert!(CacheAreas::ALL.contains(CacheAreas::MEMORY));
        assert_eq!(CacheAreas::DISK | CacheAreas::MEMORY, CacheAreas::ALL);
        assert_eq!(CacheAreas::default(), CacheAreas::ALL);
        assert_eq!("memory".parse(), Ok(CacheAreas::MEMORY));
    }
}
