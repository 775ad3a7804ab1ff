use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use ringgate::error::{ErrorKind, GateError};

/// Exit status for invalid arguments or configuration, the same one clap uses for usage errors.
pub const USAGE_EXIT_CODE: u8 = 2;

/// Exit status for every other failure.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the runner binary.
///
/// Wraps [`GateError`] for failures of the run itself and provides variants for the setup
/// around it.
#[derive(Debug)]
pub enum RunnerError {
    /// Run validation or worker error.
    Gate(GateError),
    /// Configuration loading error.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The tracing subscriber could not be installed.
    Logging(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// I/O error, raised when the runtime cannot be built.
    Io(std::io::Error, CapturedBacktrace),
}

impl RunnerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            RunnerError::Gate(err) if err.kind() == ErrorKind::ConfigError => "usage error",
            RunnerError::Gate(_) => "run error",
            RunnerError::Config(_, _) => "configuration error",
            RunnerError::Logging(_, _) => "logging error",
            RunnerError::Io(_, _) => "i/o error",
        }
    }

    /// Process exit status matching this error.
    ///
    /// Invalid arguments and configuration exit with 2, every other failure with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunnerError::Gate(err) if err.kind() == ErrorKind::ConfigError => USAGE_EXIT_CODE,
            RunnerError::Config(_, _) => USAGE_EXIT_CODE,
            RunnerError::Gate(_) | RunnerError::Logging(_, _) | RunnerError::Io(_, _) => {
                FAILURE_EXIT_CODE
            }
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            RunnerError::Gate(err) => err.backtrace(),
            RunnerError::Config(_, cb) => Some(&cb.0),
            RunnerError::Logging(_, cb) => Some(&cb.0),
            RunnerError::Io(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        RunnerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Creates a logging setup error from any source.
    pub fn logging<E: Error + Send + Sync + 'static>(err: E) -> Self {
        RunnerError::Logging(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("ringgate failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {}\n", self));

        if !matches!(self, RunnerError::Gate(err) if err.errors().is_some()) {
            let mut source = Error::source(self);
            let mut idx = 1usize;
            while let Some(err) = source {
                out.push_str(&format!("cause {idx}: {err}\n"));
                source = err.source();
                idx += 1;
            }
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Gate(err) => write!(f, "{err}"),
            RunnerError::Config(source, _) => write!(f, "configuration error: {source}"),
            RunnerError::Logging(source, _) => write!(f, "logging error: {source}"),
            RunnerError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunnerError::Gate(err) => err.source(),
            RunnerError::Config(source, _) | RunnerError::Logging(source, _) => {
                Some(source.as_ref())
            }
            RunnerError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<GateError> for RunnerError {
    fn from(err: GateError) -> Self {
        RunnerError::Gate(err)
    }
}
