//! Outcome of a complete run.

use std::fmt;

use crate::gate::GateSnapshot;
use crate::workers::{ConsumerExit, ConsumerReport, ProducerReport};

/// Totals and per-worker reports collected once every worker has been joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_produced: u64,
    pub total_consumed: u64,
    /// Items the producers were asked to insert, `producers * items_per_producer`.
    pub expected_items: u64,
    pub sentinels_injected: usize,
    pub sentinels_reclaimed: usize,
    /// Whether the run was cut short by a cancellation request.
    pub cancelled: bool,
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<ConsumerReport>,
    /// State of the gate after teardown.
    pub final_snapshot: GateSnapshot,
}

impl RunSummary {
    /// Every produced item was consumed exactly once.
    ///
    /// Sentinels are not items and are never part of either total.
    pub fn is_consistent(&self) -> bool {
        self.total_produced == self.total_consumed
    }

    /// Number of consumers that stopped with `exit`.
    pub fn consumer_exits(&self, exit: ConsumerExit) -> usize {
        self.consumers
            .iter()
            .filter(|report| report.exit == exit)
            .count()
    }

    /// All consumed items, sorted.
    pub fn consumed_items(&self) -> Vec<u64> {
        let mut items: Vec<u64> = self
            .consumers
            .iter()
            .flat_map(|report| report.consumed.iter().copied())
            .collect();
        items.sort_unstable();

        items
    }

    /// All produced items, sorted.
    pub fn produced_items(&self) -> Vec<u64> {
        let mut items: Vec<u64> = self
            .producers
            .iter()
            .flat_map(|report| report.produced.iter().copied())
            .collect();
        items.sort_unstable();

        items
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            write!(
                f,
                "production and consumption completed successfully, total items: {}",
                self.total_produced
            )?;
        } else {
            write!(
                f,
                "error: produced items ({}) do not match consumed items ({})",
                self.total_produced, self.total_consumed
            )?;
        }

        if self.cancelled {
            write!(f, " (run cancelled, {} expected)", self.expected_items)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total_produced: u64, total_consumed: u64) -> RunSummary {
        RunSummary {
            total_produced,
            total_consumed,
            expected_items: 4,
            sentinels_injected: 2,
            sentinels_reclaimed: 1,
            cancelled: false,
            producers: vec![ProducerReport {
                producer_id: 1,
                produced: vec![5, 6, 7, 8],
                cancelled: false,
            }],
            consumers: vec![
                ConsumerReport {
                    consumer_id: 1,
                    consumed: vec![6, 8],
                    exit: ConsumerExit::Sentinel,
                },
                ConsumerReport {
                    consumer_id: 2,
                    consumed: vec![5, 7],
                    exit: ConsumerExit::ProductionExhausted,
                },
            ],
            final_snapshot: GateSnapshot {
                capacity: 2,
                buffered: 0,
                total_produced,
                total_consumed,
                empty_permits: 2,
                full_permits: 0,
            },
        }
    }

    #[test]
    fn test_consistent_summary() {
        let summary = summary(4, 4);

        assert!(summary.is_consistent());
        assert_eq!(summary.consumed_items(), summary.produced_items());
        assert_eq!(summary.consumer_exits(ConsumerExit::Sentinel), 1);
        assert_eq!(summary.consumer_exits(ConsumerExit::Cancelled), 0);
        assert_eq!(
            summary.to_string(),
            "production and consumption completed successfully, total items: 4"
        );
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut summary = summary(4, 3);
        summary.cancelled = true;

        assert!(!summary.is_consistent());
        assert_eq!(
            summary.to_string(),
            "error: produced items (4) do not match consumed items (3) (run cancelled, 4 expected)"
        );
    }
}
