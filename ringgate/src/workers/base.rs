use std::fmt;
use std::future::Future;

use crate::error::GateResult;
use crate::types::{ConsumerId, ProducerId};

/// Role of a worker, which decides how its failures are classified.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerRole {
    Producer,
    Consumer,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Producer => f.write_str("producer"),
            WorkerRole::Consumer => f.write_str("consumer"),
        }
    }
}

/// Identity of a running worker, used for logging and error reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerType {
    /// Worker inserting its quota of items into the ring.
    Producer { producer_id: ProducerId },
    /// Worker removing items until it observes termination.
    Consumer { consumer_id: ConsumerId },
}

impl WorkerType {
    pub fn role(&self) -> WorkerRole {
        match self {
            WorkerType::Producer { .. } => WorkerRole::Producer,
            WorkerType::Consumer { .. } => WorkerRole::Consumer,
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerType::Producer { producer_id } => write!(f, "producer {producer_id}"),
            WorkerType::Consumer { consumer_id } => write!(f, "consumer {consumer_id}"),
        }
    }
}

/// A background worker that can be spawned into a [`crate::workers::pool::WorkerPool`].
///
/// `State` is a handle through which the worker's progress can be observed while it runs, and
/// `Output` is the report it returns on completion.
pub trait Worker: Send + 'static {
    /// Report returned when the worker completes.
    type Output: Send + 'static;

    /// Observable progress of the worker.
    type State;

    /// Returns the identity of this worker.
    fn worker_type(&self) -> WorkerType;

    /// Returns a handle to the worker's state that stays valid after it completes.
    fn state(&self) -> Self::State;

    /// Runs the worker to completion.
    fn run(self) -> impl Future<Output = GateResult<Self::Output>> + Send + 'static;
}
