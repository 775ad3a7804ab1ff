use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{ErrorKind, GateResult};
use crate::gate_error;
use crate::workers::base::{Worker, WorkerRole, WorkerType};

/// Set of running workers of a single role.
///
/// Owns the spawned tasks and collects their reports when joined. Workers are never aborted
/// by the pool; they stop on their own or through the cancellation channel.
#[derive(Debug)]
pub struct WorkerPool<R> {
    role: WorkerRole,
    join_set: JoinSet<(WorkerType, GateResult<R>)>,
}

impl<R> WorkerPool<R>
where
    R: Send + 'static,
{
    /// Creates an empty pool for workers of `role`.
    pub fn new(role: WorkerRole) -> Self {
        Self {
            role,
            join_set: JoinSet::new(),
        }
    }

    /// Number of workers spawned and not yet joined.
    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Spawns `worker` on the current runtime and returns its state handle.
    ///
    /// Fails if called outside of a tokio runtime, in which case nothing is spawned.
    pub fn spawn<W>(&mut self, worker: W) -> GateResult<W::State>
    where
        W: Worker<Output = R>,
    {
        let runtime = Handle::try_current().map_err(|err| {
            gate_error!(
                ErrorKind::WorkerSpawnFailed,
                "No runtime available to start worker",
                worker.worker_type(),
                source: err
            )
        })?;

        let worker_type = worker.worker_type();
        let state = worker.state();

        self.join_set.spawn_on(
            async move {
                let result = worker.run().await;
                (worker_type, result)
            },
            &runtime,
        );

        debug!(%worker_type, "spawned worker in pool");

        Ok(state)
    }

    /// Waits for every worker in the pool and returns their reports.
    ///
    /// All workers are joined even when some of them fail. Failures and panics are collected
    /// and returned together.
    pub async fn wait_all(&mut self) -> GateResult<Vec<R>> {
        let mut reports = Vec::with_capacity(self.join_set.len());
        let mut errors = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            match result {
                Ok((worker_type, Ok(report))) => {
                    debug!(%worker_type, "worker completed");
                    reports.push(report);
                }
                Ok((worker_type, Err(err))) => {
                    error!(%worker_type, error = %err, "worker completed with error");
                    errors.push(err);
                }
                Err(join_err) => {
                    if join_err.is_cancelled() {
                        debug!(role = %self.role, "worker task was cancelled");
                        continue;
                    }

                    let (kind, description) = match self.role {
                        WorkerRole::Producer => {
                            (ErrorKind::ProducerWorkerPanic, "Producer worker panicked")
                        }
                        WorkerRole::Consumer => {
                            (ErrorKind::ConsumerWorkerPanic, "Consumer worker panicked")
                        }
                    };
                    errors.push(gate_error!(kind, description, join_err));
                }
            }
        }

        if errors.is_empty() {
            Ok(reports)
        } else {
            Err(errors.into())
        }
    }
}
