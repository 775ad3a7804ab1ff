use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A field holds a value outside of its accepted domain.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// The requested number of workers of a given role is outside `1..=max`.
    #[error("invalid number of {role}: {requested} (must be between 1 and {max})")]
    WorkerCountOutOfRange {
        role: &'static str,
        requested: usize,
        max: usize,
    },
}
