use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Worker population limits and per-producer quota.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkersConfig {
    /// Number of items every producer inserts before finishing.
    #[serde(default = "default_items_per_producer")]
    pub items_per_producer: u64,
    /// Upper bound on the number of producers a run may start.
    #[serde(default = "default_max_producers")]
    pub max_producers: usize,
    /// Upper bound on the number of consumers a run may start.
    #[serde(default = "default_max_consumers")]
    pub max_consumers: usize,
}

impl WorkersConfig {
    /// Default number of items per producer.
    pub const DEFAULT_ITEMS_PER_PRODUCER: u64 = 50;

    /// Default maximum number of producers.
    pub const DEFAULT_MAX_PRODUCERS: usize = 5;

    /// Default maximum number of consumers.
    pub const DEFAULT_MAX_CONSUMERS: usize = 5;

    /// Validates quota and limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items_per_producer == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "workers.items_per_producer".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.max_producers == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "workers.max_producers".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.max_consumers == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "workers.max_consumers".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        // The highest item of the last producer is `(max_producers + 1) * items_per_producer`.
        let largest_item = (self.max_producers as u64)
            .checked_add(1)
            .and_then(|producers| producers.checked_mul(self.items_per_producer));
        if largest_item.is_none() {
            return Err(ValidationError::InvalidFieldValue {
                field: "workers.items_per_producer".to_string(),
                constraint: format!(
                    "item values of {} producers must fit in 64 bits",
                    self.max_producers
                ),
            });
        }

        Ok(())
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            items_per_producer: default_items_per_producer(),
            max_producers: default_max_producers(),
            max_consumers: default_max_consumers(),
        }
    }
}

fn default_items_per_producer() -> u64 {
    WorkersConfig::DEFAULT_ITEMS_PER_PRODUCER
}

fn default_max_producers() -> usize {
    WorkersConfig::DEFAULT_MAX_PRODUCERS
}

fn default_max_consumers() -> usize {
    WorkersConfig::DEFAULT_MAX_CONSUMERS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workers(items_per_producer: u64) -> WorkersConfig {
        WorkersConfig {
            items_per_producer,
            max_producers: 5,
            max_consumers: 5,
        }
    }

    #[test]
    fn test_largest_quota_whose_items_fit_is_accepted() {
        assert!(workers(u64::MAX / 6).validate().is_ok());
    }

    #[test]
    fn test_quota_overflowing_item_values_is_rejected() {
        for quota in [u64::MAX / 6 + 1, u64::MAX / 2, u64::MAX] {
            assert!(matches!(
                workers(quota).validate(),
                Err(ValidationError::InvalidFieldValue { field, .. })
                    if field == "workers.items_per_producer"
            ));
        }
    }
}
