//! Core value types flowing through the ring.

use std::fmt;

/// Identity of a producer, starting at 1. Used for item generation and diagnostics.
pub type ProducerId = u64;

/// Identity of a consumer, starting at 1. Used for diagnostics only.
pub type ConsumerId = u64;

/// A value stored in a ring slot.
///
/// End of stream is its own variant, so no regular value can ever be mistaken for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    /// A produced value, strictly positive and unique across producers.
    Regular(u64),
    /// No more items will ever be produced for the consumer that observes it.
    Shutdown,
}

impl Item {
    /// Returns the regular value carried by this item, if any.
    pub fn value(&self) -> Option<u64> {
        match self {
            Item::Regular(value) => Some(*value),
            Item::Shutdown => None,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Item::Shutdown)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Regular(value) => write!(f, "{value}"),
            Item::Shutdown => f.write_str("<shutdown>"),
        }
    }
}

/// Computes the `sequence`-th item (0-based) of producer `producer_id` given the per-producer
/// quota.
///
/// Values of distinct producers never overlap: producer `p` owns the range
/// `p * quota + 1 ..= p * quota + quota`.
pub fn producer_item(producer_id: ProducerId, quota: u64, sequence: u64) -> u64 {
    producer_id * quota + sequence + 1
}
