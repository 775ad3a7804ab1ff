//! Shared configuration types for ringgate runs.

mod base;
mod buffer;
mod pacing;
mod run;
mod workers;

pub use base::ValidationError;
pub use buffer::BufferConfig;
pub use pacing::{DelayRange, PacingConfig};
pub use run::RunConfig;
pub use workers::WorkersConfig;
