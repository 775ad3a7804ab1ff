use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Bounded buffer configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BufferConfig {
    /// Number of slots in the ring. Fixed for the whole run.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl BufferConfig {
    /// Default ring capacity.
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Ensures the capacity is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "buffer.capacity".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    BufferConfig::DEFAULT_CAPACITY
}
