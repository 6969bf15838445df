// strings-scanner - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// One enum per subsystem; all preserve the causal chain via `source()`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all strings-scanner operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ScannerError {
    /// The heuristic table could not be built. Startup-fatal.
    Heuristics(PatternCompilationError),

    /// A task payload could not be interpreted.
    Task(MalformedTaskError),

    /// Processing a batch failed as a whole.
    Worker(WorkerError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// A file the worker needs could not be opened or read.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristics(e) => write!(f, "Heuristic table error: {e}"),
            Self::Task(e) => write!(f, "Malformed task: {e}"),
            Self::Worker(e) => write!(f, "Worker error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(f, "I/O error during {operation} on '{}': {source}", path.display()),
        }
    }
}

impl std::error::Error for ScannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Heuristics(e) => Some(e),
            Self::Task(e) => Some(e),
            Self::Worker(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Heuristic table errors
// ---------------------------------------------------------------------------

/// Errors raised while building a `HeuristicSet`. Any of these means the
/// worker must not start serving tasks.
#[derive(Debug)]
pub enum PatternCompilationError {
    /// Embedded or supplied TOML table could not be parsed.
    TomlParse { source: toml::de::Error },

    /// A heuristic has an empty name.
    EmptyName { index: usize },

    /// Two heuristics share a name.
    DuplicateName { heuristic: String },

    /// A heuristic has no patterns.
    NoPatterns { heuristic: String },

    /// A pattern source exceeds the maximum allowed length.
    PatternTooLong {
        heuristic: String,
        length: usize,
        max_length: usize,
    },

    /// A pattern source is not a valid regular expression.
    InvalidRegex {
        heuristic: String,
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for PatternCompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { source } => write!(f, "Failed to parse heuristic table: {source}"),
            Self::EmptyName { index } => write!(f, "Heuristic #{index} has an empty name"),
            Self::DuplicateName { heuristic } => {
                write!(f, "Heuristic '{heuristic}' is declared more than once")
            }
            Self::NoPatterns { heuristic } => {
                write!(f, "Heuristic '{heuristic}' has no patterns")
            }
            Self::PatternTooLong {
                heuristic,
                length,
                max_length,
            } => write!(
                f,
                "Heuristic '{heuristic}': pattern is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
            Self::InvalidRegex {
                heuristic,
                pattern,
                source,
            } => write!(
                f,
                "Heuristic '{heuristic}': invalid pattern '{pattern}': {source}"
            ),
        }
    }
}

impl std::error::Error for PatternCompilationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source } => Some(source),
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PatternCompilationError> for ScannerError {
    fn from(e: PatternCompilationError) -> Self {
        Self::Heuristics(e)
    }
}

// ---------------------------------------------------------------------------
// Task errors
// ---------------------------------------------------------------------------

/// A task that cannot be interpreted at all. Distinct from a batch that
/// simply produced no matches.
#[derive(Debug)]
pub enum MalformedTaskError {
    /// A task line from the input stream is not valid task JSON.
    Decode {
        line: usize,
        source: serde_json::Error,
    },

    /// A task line from the input stream is not valid UTF-8.
    InvalidUtf8 {
        line: usize,
        source: std::string::FromUtf8Error,
    },

    /// The input stream failed while reading a line. Nothing after it is read.
    Unreadable { line: usize, source: io::Error },

    /// A required payload field is absent (or null).
    MissingField { field: &'static str },

    /// A payload field has the wrong JSON type.
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// An element of the `data` array is not a string.
    NonStringElement { index: usize },

    /// The sample identifier is empty or not a hex digest.
    InvalidSampleId { value: String },
}

impl fmt::Display for MalformedTaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode { line, source } => {
                write!(f, "Task on line {line} is not valid JSON: {source}")
            }
            Self::InvalidUtf8 { line, source } => {
                write!(f, "Task on line {line} is not valid UTF-8: {source}")
            }
            Self::Unreadable { line, source } => {
                write!(f, "Failed reading task input at line {line}: {source}")
            }
            Self::MissingField { field } => {
                write!(f, "Payload is missing required field '{field}'")
            }
            Self::WrongType { field, expected } => {
                write!(f, "Payload field '{field}' must be {expected}")
            }
            Self::NonStringElement { index } => {
                write!(f, "Payload 'data' element {index} is not a string")
            }
            Self::InvalidSampleId { value } => {
                write!(f, "Payload 'sha256' value {value:?} is not a hex digest")
            }
        }
    }
}

impl std::error::Error for MalformedTaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            Self::InvalidUtf8 { source, .. } => Some(source),
            Self::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<MalformedTaskError> for ScannerError {
    fn from(e: MalformedTaskError) -> Self {
        Self::Task(e)
    }
}

// ---------------------------------------------------------------------------
// Reporting errors
// ---------------------------------------------------------------------------

/// A single report call to the sample-metadata service failed.
#[derive(Debug)]
pub enum ReportingFailure {
    /// Network or protocol failure before a status was received.
    Transport { url: String, source: ureq::Error },

    /// The service answered with a non-success status.
    Status { url: String, status: u16 },

    /// The response body could not be read or is not JSON.
    InvalidResponse { url: String, reason: String },
}

impl fmt::Display for ReportingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { url, source } => write!(f, "POST {url} failed: {source}"),
            Self::Status { url, status } => write!(f, "POST {url} returned HTTP {status}"),
            Self::InvalidResponse { url, reason } => {
                write!(f, "POST {url} returned an unusable response: {reason}")
            }
        }
    }
}

impl std::error::Error for ReportingFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Worker errors
// ---------------------------------------------------------------------------

/// Errors returned by `StringClassificationWorker::process`.
#[derive(Debug)]
pub enum WorkerError {
    /// The batch could not be interpreted; no reports were sent.
    Malformed(MalformedTaskError),

    /// Some reports failed under the collect-and-surface policy.
    /// Every match in the batch was still attempted.
    PartialReportFailure {
        sample_id: String,
        attempted: usize,
        failures: Vec<ReportingFailure>,
    },
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "{e}"),
            Self::PartialReportFailure {
                sample_id,
                attempted,
                failures,
            } => {
                write!(
                    f,
                    "Sample {sample_id}: {} of {attempted} reports failed",
                    failures.len()
                )?;
                if let Some(first) = failures.first() {
                    write!(f, " (first: {first})")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            Self::PartialReportFailure { failures, .. } => failures
                .first()
                .map(|e| e as &(dyn std::error::Error + 'static)),
        }
    }
}

impl From<MalformedTaskError> for WorkerError {
    fn from(e: MalformedTaskError) -> Self {
        Self::Malformed(e)
    }
}

impl From<WorkerError> for ScannerError {
    fn from(e: WorkerError) -> Self {
        Self::Worker(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading. Only problems that leave the
/// worker unable to run are errors; out-of-range optional values become
/// warnings and fall back to defaults.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A required setting is absent.
    MissingField { field: &'static str },

    /// A required setting has an unusable value.
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::MissingField { field } => {
                write!(f, "Config is missing required setting '{field}'")
            }
            Self::InvalidValue {
                field,
                value,
                expected,
            } => write!(f, "Config '{field}' = '{value}' is invalid. Expected: {expected}"),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ScannerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for strings-scanner results.
pub type Result<T> = std::result::Result<T, ScannerError>;
