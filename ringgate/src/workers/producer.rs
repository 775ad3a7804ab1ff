use ringgate_config::shared::DelayRange;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::concurrency::pacing::suspend;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::GateResult;
use crate::gate::Gate;
use crate::types::{Item, ProducerId, producer_item};
use crate::workers::base::{Worker, WorkerType};

/// Progress of a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// Still inserting; `inserted` items are already in the ring.
    Producing { inserted: u64 },
    /// The whole quota was inserted.
    Finished,
    /// Stopped early on a cancellation request.
    Cancelled { inserted: u64 },
}

/// Receiver through which a producer's progress can be observed.
pub type ProducerStateRx = watch::Receiver<ProducerState>;

/// Items a producer inserted, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReport {
    pub producer_id: ProducerId,
    pub produced: Vec<u64>,
    pub cancelled: bool,
}

/// Worker inserting a fixed quota of deterministic items into the ring.
///
/// Producer `p` with quota `q` inserts `p * q + 1 ..= p * q + q` in increasing order, waiting a
/// random interval before each insertion to simulate work.
#[derive(Debug)]
pub struct ProducerWorker {
    producer_id: ProducerId,
    quota: u64,
    gate: Gate,
    delay: DelayRange,
    shutdown_rx: ShutdownRx,
    state_tx: watch::Sender<ProducerState>,
}

impl ProducerWorker {
    pub fn new(
        producer_id: ProducerId,
        quota: u64,
        gate: Gate,
        delay: DelayRange,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        let (state_tx, _) = watch::channel(ProducerState::Producing { inserted: 0 });

        Self {
            producer_id,
            quota,
            gate,
            delay,
            shutdown_rx,
            state_tx,
        }
    }

    async fn produce(self) -> GateResult<ProducerReport> {
        let producer_id = self.producer_id;
        info!(producer_id, quota = self.quota, "producer started");

        let mut produced = Vec::new();

        for sequence in 0..self.quota {
            let item = producer_item(producer_id, self.quota, sequence);

            if suspend(&self.delay, &self.shutdown_rx).await.is_cancelled() {
                return Ok(self.cancel(produced));
            }

            let insertion = tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => {
                    return Ok(self.cancel(produced));
                }
                insertion = self.gate.put(Item::Regular(item)) => insertion?,
            };

            info!(
                producer_id,
                item,
                buffered = insertion.buffered,
                "item produced"
            );

            produced.push(item);
            self.state_tx.send_replace(ProducerState::Producing {
                inserted: produced.len() as u64,
            });
        }

        self.state_tx.send_replace(ProducerState::Finished);
        info!(producer_id, produced = produced.len(), "producer finished");

        Ok(ProducerReport {
            producer_id,
            produced,
            cancelled: false,
        })
    }

    fn cancel(&self, produced: Vec<u64>) -> ProducerReport {
        let inserted = produced.len() as u64;
        self.state_tx.send_replace(ProducerState::Cancelled { inserted });
        debug!(producer_id = self.producer_id, inserted, "producer stopped on cancellation");

        ProducerReport {
            producer_id: self.producer_id,
            produced,
            cancelled: true,
        }
    }
}

impl Worker for ProducerWorker {
    type Output = ProducerReport;
    type State = ProducerStateRx;

    fn worker_type(&self) -> WorkerType {
        WorkerType::Producer {
            producer_id: self.producer_id,
        }
    }

    fn state(&self) -> ProducerStateRx {
        self.state_tx.subscribe()
    }

    async fn run(self) -> GateResult<ProducerReport> {
        self.produce().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::gate::Removal;

    #[tokio::test]
    async fn test_producer_inserts_its_quota_in_order() {
        let gate = Gate::new(10);
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();

        let worker = ProducerWorker::new(1, 5, gate.clone(), DelayRange::zero(), shutdown_rx);
        let state = worker.state();
        let report = worker.run().await.unwrap();

        assert_eq!(report.produced, vec![6, 7, 8, 9, 10]);
        assert!(!report.cancelled);
        assert_eq!(*state.borrow(), ProducerState::Finished);

        let mut in_ring = Vec::new();
        while let Some(slot) = gate.try_reserve_full() {
            if let Removal::Regular { item, .. } = gate.take(slot).await.unwrap() {
                in_ring.push(item);
            }
        }
        assert_eq!(in_ring, report.produced);
        assert_eq!(gate.snapshot().await.total_produced, 5);
    }

    #[tokio::test]
    async fn test_producer_blocked_on_full_ring_stops_on_cancellation() {
        let gate = Gate::new(2);
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        let worker = ProducerWorker::new(2, 5, gate.clone(), DelayRange::zero(), shutdown_rx);
        let state = worker.state();
        let handle = tokio::spawn(worker.run());

        // Two items fill the ring, the third admission waits for a free slot.
        let mut state_rx = state.clone();
        state_rx
            .wait_for(|state| matches!(state, ProducerState::Producing { inserted: 2 }))
            .await
            .unwrap();
        shutdown_tx.shutdown();

        let report = handle.await.unwrap().unwrap();
        assert!(report.cancelled);
        assert_eq!(report.produced, vec![11, 12]);
        assert_eq!(*state.borrow(), ProducerState::Cancelled { inserted: 2 });

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.buffered, 2);
        assert!(snapshot.is_quiescent_consistent());
    }
}
