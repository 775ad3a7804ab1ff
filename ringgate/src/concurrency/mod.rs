//! Concurrency utilities shared by workers and the pipeline.
//!
//! - [`shutdown`] broadcasts a cancellation request to every worker at once.
//! - [`pacing`] samples the simulated work and back-off durations and suspends a worker for
//!   them, waking early when cancellation is requested.

pub mod pacing;
pub mod shutdown;
