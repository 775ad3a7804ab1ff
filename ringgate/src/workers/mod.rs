//! Producer and consumer workers and the pool that runs them.

pub mod base;
pub mod consumer;
pub mod pool;
pub mod producer;

pub use consumer::{ConsumerExit, ConsumerReport, ConsumerState, ConsumerStateRx};
pub use producer::{ProducerReport, ProducerState, ProducerStateRx};
