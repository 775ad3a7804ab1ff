//! Error types and result definitions for ringgate runs.
//!
//! [`GateError`] carries a classification, a static description, optional dynamic detail and
//! source, and the callsite where it was raised. Failures of several workers are aggregated into
//! a single error so that a run reports every problem at once.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use ringgate_config::shared::ValidationError;

/// Result type for ringgate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Payload stored for single [`GateError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for ringgate.
#[derive(Debug, Clone)]
pub struct GateError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Errors from several workers collected while joining them.
    Many {
        errors: Vec<GateError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors raised while configuring or running workers.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid run parameters, detected before any worker starts.
    ConfigError,
    /// The gate or a worker reached a state the protocol rules out.
    InvalidState,
    /// The runtime could not start the workers.
    WorkerSpawnFailed,
    ProducerWorkerPanic,
    ConsumerWorkerPanic,
    IoError,
    Unknown,
}

impl GateError {
    /// Returns the [`ErrorKind`] of this error, or of the first aggregated error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns every [`ErrorKind`] contained in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the dynamic detail, or the first available one for aggregated errors.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, if this error is an aggregate.
    pub fn errors(&self) -> Option<&[GateError]> {
        match self.repr {
            ErrorRepr::Single(_) => None,
            ErrorRepr::Many { ref errors, .. } => Some(errors),
        }
    }

    /// Returns the captured backtrace for single errors.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Attaches an originating error. Has no effect on aggregated errors.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        GateError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for GateError {
    fn eq(&self, other: &GateError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail:")?;
                    for line in detail.lines() {
                        write!(f, "\n    {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for GateError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            // Aggregates forward the first contained error as their source.
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`GateError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for GateError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> GateError {
        GateError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`GateError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for GateError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> GateError {
        GateError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates several errors. A single error is returned unwrapped.
impl<E> From<Vec<E>> for GateError
where
    E: Into<GateError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> GateError {
        let location = Location::caller();

        let mut errors: Vec<GateError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        GateError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

impl From<std::io::Error> for GateError {
    #[track_caller]
    fn from(err: std::io::Error) -> GateError {
        let detail = err.to_string();
        GateError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl From<ValidationError> for GateError {
    #[track_caller]
    fn from(err: ValidationError) -> GateError {
        let detail = err.to_string();
        GateError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid run configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_error;

    #[test]
    fn test_single_error_display_contains_kind_and_detail() {
        let err = gate_error!(ErrorKind::InvalidState, "Ring overflow", "capacity 2");
        let rendered = err.to_string();

        assert!(rendered.starts_with("[InvalidState] Ring overflow @ "));
        assert!(rendered.contains("capacity 2"));
        assert_eq!(err.detail(), Some("capacity 2"));
    }

    #[test]
    fn test_vec_of_one_error_is_unwrapped() {
        let err: GateError = vec![gate_error!(ErrorKind::ConsumerWorkerPanic, "boom")].into();

        assert!(err.errors().is_none());
        assert_eq!(err.kind(), ErrorKind::ConsumerWorkerPanic);
    }

    #[test]
    fn test_aggregated_errors_expose_all_kinds() {
        let err: GateError = vec![
            gate_error!(ErrorKind::ProducerWorkerPanic, "first"),
            gate_error!(ErrorKind::ConsumerWorkerPanic, "second"),
        ]
        .into();

        assert_eq!(
            err.kinds(),
            vec![ErrorKind::ProducerWorkerPanic, ErrorKind::ConsumerWorkerPanic]
        );
        assert_eq!(err.kind(), ErrorKind::ProducerWorkerPanic);
        assert!(err.to_string().starts_with("[Many] 2 errors aggregated"));
        assert!(error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_error_maps_to_config_error() {
        let err: GateError = ValidationError::WorkerCountOutOfRange {
            role: "producers",
            requested: 0,
            max: 5,
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert!(err.detail().unwrap().contains("producers"));
    }
}
