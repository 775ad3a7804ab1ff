//! Bounded-buffer producer/consumer coordination.
//!
//! Producers insert items into a fixed-capacity ring through a [`gate::Gate`], consumers remove
//! them, and a [`coordinator::ShutdownCoordinator`] stops every consumer with its own sentinel
//! once all producers are done. [`pipeline::Pipeline`] wires a complete run together.

pub mod buffer;
pub mod concurrency;
pub mod coordinator;
pub mod error;
pub mod gate;
mod macros;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod workers;
