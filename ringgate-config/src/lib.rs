//! Configuration for ringgate runs.
//!
//! Holds the typed settings for the bounded buffer, the worker population and the simulated
//! work pacing, together with the loader that merges configuration files and `APP_` environment
//! overrides into them.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
