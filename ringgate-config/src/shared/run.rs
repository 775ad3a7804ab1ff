use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{BufferConfig, PacingConfig, ValidationError, WorkersConfig};

/// Complete configuration of a producer/consumer run.
///
/// The number of producers and consumers is not part of it: those are supplied per run and
/// checked against the limits here with [`RunConfig::check_worker_counts`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl RunConfig {
    /// Validates every section and the constraints between them.
    ///
    /// Every consumer receives its own sentinel through the ring after production ended, so the
    /// ring must be able to hold one sentinel per consumer at the same time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.buffer.validate()?;
        self.workers.validate()?;
        self.pacing.validate()?;

        if self.workers.max_consumers > self.buffer.capacity {
            return Err(ValidationError::InvalidFieldValue {
                field: "workers.max_consumers".to_string(),
                constraint: format!(
                    "must not exceed `buffer.capacity` ({})",
                    self.buffer.capacity
                ),
            });
        }

        Ok(())
    }

    /// Checks that `producers` and `consumers` are within `1..=max` for their role.
    pub fn check_worker_counts(
        &self,
        producers: usize,
        consumers: usize,
    ) -> Result<(), ValidationError> {
        if producers == 0 || producers > self.workers.max_producers {
            return Err(ValidationError::WorkerCountOutOfRange {
                role: "producers",
                requested: producers,
                max: self.workers.max_producers,
            });
        }

        if consumers == 0 || consumers > self.workers.max_consumers {
            return Err(ValidationError::WorkerCountOutOfRange {
                role: "consumers",
                requested: consumers,
                max: self.workers.max_consumers,
            });
        }

        Ok(())
    }

    /// Total number of regular items `producers` workers insert over a run.
    ///
    /// Cannot overflow once the configuration is validated and `producers` is within the limit.
    pub fn expected_items(&self, producers: usize) -> u64 {
        (producers as u64).saturating_mul(self.workers.items_per_producer)
    }
}

impl Config for RunConfig {
    const NAME: &'static str = "run configuration";
}
