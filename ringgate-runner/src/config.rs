use ringgate_config::load_config;
use ringgate_config::shared::RunConfig;

use crate::error::{RunnerError, RunnerResult};

/// Loads and validates the run configuration.
///
/// Uses the standard configuration loading mechanism from [`ringgate_config`] and validates the
/// resulting [`RunConfig`] before returning it.
pub fn load_run_config() -> RunnerResult<RunConfig> {
    let config = load_config::<RunConfig>().map_err(RunnerError::config)?;
    config.validate().map_err(RunnerError::config)?;

    Ok(config)
}
