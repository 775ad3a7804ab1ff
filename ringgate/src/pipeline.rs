use std::sync::Arc;

use ringgate_config::shared::RunConfig;
use tracing::{error, info, warn};

use crate::bail;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::coordinator::ShutdownCoordinator;
use crate::error::{ErrorKind, GateResult};
use crate::gate::Gate;
use crate::report::RunSummary;
use crate::workers::base::WorkerRole;
use crate::workers::consumer::ConsumerWorker;
use crate::workers::pool::WorkerPool;
use crate::workers::producer::ProducerWorker;
use crate::workers::{
    ConsumerExit, ConsumerReport, ConsumerStateRx, ProducerReport, ProducerStateRx,
};

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started {
        producer_pool: WorkerPool<ProducerReport>,
        consumer_pool: WorkerPool<ConsumerReport>,
        producer_states: Vec<ProducerStateRx>,
        consumer_states: Vec<ConsumerStateRx>,
    },
}

/// A single producer/consumer run over one bounded ring.
///
/// The run is validated on construction, started with [`Pipeline::start`] and driven to
/// completion with [`Pipeline::wait`], which joins producers, stops consumers through sentinels
/// and reports the totals.
#[derive(Debug)]
pub struct Pipeline {
    config: Arc<RunConfig>,
    producers: usize,
    consumers: usize,
    gate: Gate,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
}

impl Pipeline {
    /// Validates `config` and the worker counts and prepares an empty ring.
    ///
    /// No worker is started and the ring is left untouched when validation fails.
    pub fn new(config: RunConfig, producers: usize, consumers: usize) -> GateResult<Self> {
        config.validate()?;
        config.check_worker_counts(producers, consumers)?;

        let (shutdown_tx, _) = create_shutdown_channel();
        let gate = Gate::new(config.buffer.capacity);

        Ok(Self {
            config: Arc::new(config),
            producers,
            consumers,
            gate,
            state: PipelineState::NotStarted,
            shutdown_tx,
        })
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Total number of regular items the producers of this run insert.
    pub fn expected_items(&self) -> u64 {
        self.config.expected_items(self.producers)
    }

    /// Progress handles of the producers, empty before the pipeline is started.
    pub fn producer_states(&self) -> Vec<ProducerStateRx> {
        match &self.state {
            PipelineState::NotStarted => Vec::new(),
            PipelineState::Started {
                producer_states, ..
            } => producer_states.clone(),
        }
    }

    /// Lifecycle handles of the consumers, empty before the pipeline is started.
    pub fn consumer_states(&self) -> Vec<ConsumerStateRx> {
        match &self.state {
            PipelineState::NotStarted => Vec::new(),
            PipelineState::Started {
                consumer_states, ..
            } => consumer_states.clone(),
        }
    }

    /// Spawns every producer and consumer on the current runtime.
    ///
    /// If a worker cannot be spawned, the workers started so far are aborted together with
    /// their pools and the error is returned.
    pub async fn start(&mut self) -> GateResult<()> {
        if matches!(self.state, PipelineState::Started { .. }) {
            bail!(ErrorKind::InvalidState, "Pipeline was already started");
        }

        info!(
            capacity = self.config.buffer.capacity,
            producers = self.producers,
            consumers = self.consumers,
            items_per_producer = self.config.workers.items_per_producer,
            "starting pipeline over a bounded ring with counting semaphores and an access lock"
        );

        let expected_items = self.expected_items();
        let pacing = &self.config.pacing;

        let mut producer_pool = WorkerPool::new(WorkerRole::Producer);
        let mut producer_states = Vec::with_capacity(self.producers);
        for producer_id in 1..=self.producers as u64 {
            let worker = ProducerWorker::new(
                producer_id,
                self.config.workers.items_per_producer,
                self.gate.clone(),
                pacing.producer_delay,
                self.shutdown_tx.subscribe(),
            );
            producer_states.push(producer_pool.spawn(worker)?);
        }

        let mut consumer_pool = WorkerPool::new(WorkerRole::Consumer);
        let mut consumer_states = Vec::with_capacity(self.consumers);
        for consumer_id in 1..=self.consumers as u64 {
            let worker = ConsumerWorker::new(
                consumer_id,
                self.gate.clone(),
                expected_items,
                pacing.consumer_delay,
                pacing.poll_backoff,
                self.shutdown_tx.subscribe(),
            );
            consumer_states.push(consumer_pool.spawn(worker)?);
        }

        self.state = PipelineState::Started {
            producer_pool,
            consumer_pool,
            producer_states,
            consumer_states,
        };

        Ok(())
    }

    /// Drives the run to completion and returns its summary.
    ///
    /// Producers are joined first, then one sentinel per consumer is inserted, then consumers
    /// are joined and the sentinels left in the ring are reclaimed. A mismatch between produced
    /// and consumed totals is reported in the summary, not as an error.
    pub async fn wait(self) -> GateResult<RunSummary> {
        let expected_items = self.expected_items();

        let PipelineState::Started {
            mut producer_pool,
            mut consumer_pool,
            producer_states: _,
            consumer_states: _,
        } = self.state
        else {
            info!("pipeline was not started, nothing to wait for");

            return Ok(RunSummary {
                total_produced: 0,
                total_consumed: 0,
                expected_items,
                sentinels_injected: 0,
                sentinels_reclaimed: 0,
                cancelled: self.shutdown_tx.subscribe().is_shutdown(),
                producers: Vec::new(),
                consumers: Vec::new(),
                final_snapshot: self.gate.snapshot().await,
            });
        };

        let mut errors = vec![];

        info!("waiting for producers to complete");

        let producers = match producer_pool.wait_all().await {
            Ok(reports) => reports,
            Err(err) => {
                errors.push(err);

                // Without every producer the consumers could wait forever for items that never
                // arrive.
                self.shutdown_tx.shutdown();
                error!("a producer failed, cancelling the run");

                Vec::new()
            }
        };

        let coordinator = ShutdownCoordinator::new(
            self.gate.clone(),
            self.consumers,
            self.shutdown_tx.subscribe(),
        );

        let total_produced = self.gate.snapshot().await.total_produced;
        info!(total_produced, "all producers finished");

        let sentinels_injected = match coordinator.inject_sentinels().await {
            Ok(injected) => injected,
            Err(err) => {
                errors.push(err);
                self.shutdown_tx.shutdown();

                0
            }
        };

        info!("waiting for consumers to complete");

        let consumers = match consumer_pool.wait_all().await {
            Ok(reports) => reports,
            Err(err) => {
                let failed = err.kinds().len();
                errors.push(err);
                info!(failed, "consumers failed with an error");

                Vec::new()
            }
        };

        let sentinels_reclaimed = coordinator.reclaim_sentinels().await;
        let final_snapshot = self.gate.snapshot().await;

        info!(
            total_consumed = final_snapshot.total_consumed,
            "all consumers finished"
        );

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let cancelled = self.shutdown_tx.subscribe().is_shutdown();
        let summary = RunSummary {
            total_produced: final_snapshot.total_produced,
            total_consumed: final_snapshot.total_consumed,
            expected_items,
            sentinels_injected,
            sentinels_reclaimed,
            cancelled,
            producers,
            consumers,
            final_snapshot,
        };

        if summary.is_consistent() {
            info!(
                total_items = summary.total_produced,
                fallback_exits = summary.consumer_exits(ConsumerExit::ProductionExhausted),
                "production and consumption completed"
            );
        } else {
            warn!(
                total_produced = summary.total_produced,
                total_consumed = summary.total_consumed,
                "produced and consumed totals do not match"
            );
        }

        Ok(summary)
    }

    /// Requests every worker and the sentinel injection to stop at their next suspension point.
    pub fn shutdown(&self) {
        info!("trying to shut down the pipeline");

        self.shutdown_tx.shutdown();

        info!("shut down signal sent to all workers");
    }

    pub async fn shutdown_and_wait(self) -> GateResult<RunSummary> {
        self.shutdown();
        self.wait().await
    }
}
