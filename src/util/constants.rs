// strings-scanner - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "strings-scanner";

/// Application identifier used for config directories.
pub const APP_ID: &str = "strings-scanner";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Worker identity reported in logs, matching the pipeline's consumer name.
pub const WORKER_IDENTITY: &str = "karton.strings_scanner";

// =============================================================================
// Task routing
// =============================================================================

/// Header filter this worker declares interest in: (key, value) pairs.
/// A task is handled only when every pair is present in its headers.
pub const TASK_FILTER: &[(&str, &str)] = &[
    ("type", "feature"),
    ("stage", "raw"),
    ("kind", "strings"),
];

/// Payload field holding the ordered list of extracted strings.
pub const PAYLOAD_DATA_FIELD: &str = "data";

/// Payload field holding the sample's hex-encoded SHA-256.
pub const PAYLOAD_SHA256_FIELD: &str = "sha256";

// =============================================================================
// Heuristic limits
// =============================================================================

/// Maximum length of a single heuristic pattern source. Guards against
/// pathological regex compile times.
pub const MAX_PATTERN_LENGTH: usize = 1_024;

// =============================================================================
// Reporting
// =============================================================================

/// Default timeout for a single report call, in seconds.
pub const DEFAULT_REPORT_TIMEOUT_SECS: u64 = 5;

/// Minimum configurable report timeout, in seconds.
pub const MIN_REPORT_TIMEOUT_SECS: u64 = 1;

/// Maximum configurable report timeout, in seconds.
pub const MAX_REPORT_TIMEOUT_SECS: u64 = 120;

/// Default number of concurrent report calls per batch (1 = sequential).
pub const DEFAULT_REPORT_PARALLELISM: usize = 1;

/// Hard upper bound on concurrent report calls per batch.
pub const MAX_REPORT_PARALLELISM: usize = 64;

/// Path template segment appended to the reporting base URL.
/// Full URL: `{base}/sample/{sha256}/string`.
pub const REPORT_PATH_SAMPLE: &str = "sample";

/// Trailing path segment of the report URL.
pub const REPORT_PATH_STRING: &str = "string";

// =============================================================================
// Configuration
// =============================================================================

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding `[reporting] url`.
pub const URL_ENV_VAR: &str = "STRINGS_SCANNER_URL";

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither RUST_LOG, --debug, nor config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
