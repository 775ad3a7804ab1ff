use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Inclusive range of milliseconds a worker may suspend for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DelayRange {
    /// Lower bound in milliseconds.
    pub min_ms: u64,
    /// Upper bound in milliseconds.
    pub max_ms: u64,
}

impl DelayRange {
    /// Creates a range from explicit bounds.
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that never suspends.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        if self.min_ms > self.max_ms {
            return Err(ValidationError::InvalidFieldValue {
                field: field.to_string(),
                constraint: format!(
                    "`min_ms` ({}) must not exceed `max_ms` ({})",
                    self.min_ms, self.max_ms
                ),
            });
        }

        Ok(())
    }
}

/// Simulated work and back-off timings for workers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PacingConfig {
    /// Time a producer spends "producing" each item.
    #[serde(default = "default_producer_delay")]
    pub producer_delay: DelayRange,
    /// Time a consumer spends "consuming" before each poll.
    #[serde(default = "default_consumer_delay")]
    pub consumer_delay: DelayRange,
    /// Back-off applied by a consumer after a poll found no item.
    #[serde(default = "default_poll_backoff")]
    pub poll_backoff: DelayRange,
}

impl PacingConfig {
    /// Default producer delay, 10 to 110 milliseconds.
    pub const DEFAULT_PRODUCER_DELAY: DelayRange = DelayRange::new(10, 110);

    /// Default consumer delay, 1 to 101 milliseconds.
    pub const DEFAULT_CONSUMER_DELAY: DelayRange = DelayRange::new(1, 101);

    /// Default poll back-off, 1 to 101 milliseconds.
    pub const DEFAULT_POLL_BACKOFF: DelayRange = DelayRange::new(1, 101);

    /// Pacing where no worker ever sleeps. Mostly useful in tests.
    pub fn immediate() -> Self {
        Self {
            producer_delay: DelayRange::zero(),
            consumer_delay: DelayRange::zero(),
            poll_backoff: DelayRange::zero(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.producer_delay.validate("pacing.producer_delay")?;
        self.consumer_delay.validate("pacing.consumer_delay")?;
        self.poll_backoff.validate("pacing.poll_backoff")?;

        Ok(())
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            producer_delay: default_producer_delay(),
            consumer_delay: default_consumer_delay(),
            poll_backoff: default_poll_backoff(),
        }
    }
}

fn default_producer_delay() -> DelayRange {
    PacingConfig::DEFAULT_PRODUCER_DELAY
}

fn default_consumer_delay() -> DelayRange {
    PacingConfig::DEFAULT_CONSUMER_DELAY
}

fn default_poll_backoff() -> DelayRange {
    PacingConfig::DEFAULT_POLL_BACKOFF
}
