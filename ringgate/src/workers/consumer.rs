use std::fmt;

use ringgate_config::shared::DelayRange;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::concurrency::pacing::suspend;
use crate::concurrency::shutdown::ShutdownRx;
use crate::error::GateResult;
use crate::gate::{Gate, Removal};
use crate::types::ConsumerId;
use crate::workers::base::{Worker, WorkerType};

/// Why a consumer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerExit {
    /// A sentinel was observed at the head of the ring.
    Sentinel,
    /// Every expected item was produced and the ring was empty, so no item can ever arrive.
    ProductionExhausted,
    /// Cancellation was requested.
    Cancelled,
}

impl fmt::Display for ConsumerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsumerExit::Sentinel => f.write_str("sentinel"),
            ConsumerExit::ProductionExhausted => f.write_str("production exhausted"),
            ConsumerExit::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Lifecycle of a consumer.
///
/// A consumer polls while production is ongoing, drains once every expected item has been
/// produced, and terminates on a sentinel, on the fallback exit or on cancellation. Transitions
/// only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Polling,
    Draining,
    Terminated(ConsumerExit),
}

impl ConsumerState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, ConsumerState::Terminated(_))
    }
}

/// Receiver through which a consumer's lifecycle can be observed.
pub type ConsumerStateRx = watch::Receiver<ConsumerState>;

/// Items a consumer removed, in removal order, and how it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub consumer_id: ConsumerId,
    pub consumed: Vec<u64>,
    pub exit: ConsumerExit,
}

#[derive(Debug)]
pub struct ConsumerWorker {
    consumer_id: ConsumerId,
    gate: Gate,
    expected_items: u64,
    delay: DelayRange,
    backoff: DelayRange,
    shutdown_rx: ShutdownRx,
    state_tx: watch::Sender<ConsumerState>,
}

impl ConsumerWorker {
    pub fn new(
        consumer_id: ConsumerId,
        gate: Gate,
        expected_items: u64,
        delay: DelayRange,
        backoff: DelayRange,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConsumerState::Polling);

        Self {
            consumer_id,
            gate,
            expected_items,
            delay,
            backoff,
            shutdown_rx,
            state_tx,
        }
    }

    async fn consume(self) -> GateResult<ConsumerReport> {
        let consumer_id = self.consumer_id;
        info!(consumer_id, "consumer started");

        let mut consumed = Vec::new();

        let exit = loop {
            if suspend(&self.delay, &self.shutdown_rx).await.is_cancelled() {
                break ConsumerExit::Cancelled;
            }

            let Some(slot) = self.gate.try_reserve_full() else {
                let status = self.gate.production_status(self.expected_items).await;

                if status.is_exhausted() {
                    warn!(
                        consumer_id,
                        expected_items = self.expected_items,
                        "no sentinel observed but production is exhausted, exiting"
                    );
                    break ConsumerExit::ProductionExhausted;
                }
                if status.produced_all {
                    self.enter_draining();
                }

                debug!(consumer_id, "no item available, backing off");
                if suspend(&self.backoff, &self.shutdown_rx).await.is_cancelled() {
                    break ConsumerExit::Cancelled;
                }

                continue;
            };

            match self.gate.take(slot).await? {
                Removal::Shutdown => {
                    info!(consumer_id, "sentinel observed, consumer terminating");
                    break ConsumerExit::Sentinel;
                }
                Removal::Regular {
                    item,
                    buffered,
                    total_produced,
                    total_consumed,
                } => {
                    info!(consumer_id, item, buffered, total_consumed, "item consumed");
                    consumed.push(item);

                    if total_produced >= self.expected_items {
                        self.enter_draining();
                    }
                }
            }
        };

        self.terminate(exit);
        info!(
            consumer_id,
            consumed = consumed.len(),
            %exit,
            "consumer finished"
        );

        Ok(ConsumerReport {
            consumer_id,
            consumed,
            exit,
        })
    }

    fn enter_draining(&self) {
        let entered = self.state_tx.send_if_modified(|state| {
            if *state == ConsumerState::Polling {
                *state = ConsumerState::Draining;
                true
            } else {
                false
            }
        });

        if entered {
            debug!(consumer_id = self.consumer_id, "consumer draining");
        }
    }

    fn terminate(&self, exit: ConsumerExit) {
        // Sentinel and fallback exits only happen once production is over.
        if exit != ConsumerExit::Cancelled {
            self.enter_draining();
        }

        self.state_tx.send_replace(ConsumerState::Terminated(exit));
    }
}

impl Worker for ConsumerWorker {
    type Output = ConsumerReport;
    type State = ConsumerStateRx;

    fn worker_type(&self) -> WorkerType {
        WorkerType::Consumer {
            consumer_id: self.consumer_id,
        }
    }

    fn state(&self) -> ConsumerStateRx {
        self.state_tx.subscribe()
    }

    async fn run(self) -> GateResult<ConsumerReport> {
        self.consume().await
    }
}
