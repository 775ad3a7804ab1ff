use tracing::{debug, info};

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::GateResult;
use crate::gate::Gate;
use crate::types::Item;

/// Ends a run once every producer has been joined.
///
/// Each consumer is told to stop through its own sentinel, inserted with the same admission
/// protocol producers use, so injection waits for free slots instead of overwriting items.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    gate: Gate,
    consumers: usize,
    shutdown_rx: ShutdownRx,
}

impl ShutdownCoordinator {
    pub fn new(gate: Gate, consumers: usize, shutdown_rx: ShutdownRx) -> Self {
        Self {
            gate,
            consumers,
            shutdown_rx,
        }
    }

    /// Inserts one sentinel per consumer and returns how many were inserted.
    ///
    /// Must only be called after every producer finished. Stops early when cancellation is
    /// requested while waiting for a free slot, in which case fewer sentinels are inserted.
    pub async fn inject_sentinels(&self) -> GateResult<usize> {
        let mut injected = 0;

        for consumer in 1..=self.consumers {
            let insertion = tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => {
                    debug!(injected, "sentinel injection interrupted by cancellation");
                    break;
                }
                insertion = self.gate.put(Item::Shutdown) => insertion?,
            };

            info!(
                consumer,
                buffered = insertion.buffered,
                "sentinel inserted for consumer"
            );
            injected += 1;
        }

        Ok(injected)
    }

    /// Removes sentinels still parked in the ring once every consumer has been joined.
    ///
    /// Consumers leave the sentinel they observe in place for their peers, so at least one is
    /// left behind after a normal run.
    pub async fn reclaim_sentinels(&self) -> usize {
        self.gate.reclaim_sentinels().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::gate::Removal;

    #[tokio::test]
    async fn test_injects_one_sentinel_per_consumer() {
        let gate = Gate::new(3);
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let coordinator = ShutdownCoordinator::new(gate.clone(), 3, shutdown_rx);

        assert_eq!(coordinator.inject_sentinels().await.unwrap(), 3);

        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.buffered, 3);
        assert_eq!(snapshot.total_produced, 0);

        assert_eq!(coordinator.reclaim_sentinels().await, 3);
        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.buffered, 0);
        assert_eq!(snapshot.empty_permits, 3);
    }

    #[tokio::test]
    async fn test_injection_waits_for_free_slots() {
        let gate = Gate::new(1);
        let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
        gate.put(Item::Regular(1)).await.unwrap();

        let coordinator = ShutdownCoordinator::new(gate.clone(), 1, shutdown_rx);
        let injection = tokio::spawn(async move { coordinator.inject_sentinels().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!injection.is_finished());

        let slot = gate.try_reserve_full().unwrap();
        assert!(matches!(
            gate.take(slot).await.unwrap(),
            Removal::Regular { item: 1, .. }
        ));

        let injected = tokio::time::timeout(Duration::from_secs(5), injection)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(injected, 1);

        let slot = gate.try_reserve_full().unwrap();
        assert_eq!(gate.take(slot).await.unwrap(), Removal::Shutdown);
    }

    #[tokio::test]
    async fn test_injection_stops_on_cancellation() {
        let gate = Gate::new(1);
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        gate.put(Item::Regular(1)).await.unwrap();

        let coordinator = ShutdownCoordinator::new(gate.clone(), 2, shutdown_rx);
        let injection = tokio::spawn(async move { coordinator.inject_sentinels().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown_tx.shutdown();

        let injected = tokio::time::timeout(Duration::from_secs(5), injection)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(injected, 0);
        assert!(gate.snapshot().await.is_quiescent_consistent());
    }
}
