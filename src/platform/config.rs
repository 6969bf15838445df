// strings-scanner - platform/config.rs
//
// Config file resolution and config.toml loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance when no explicit path is given.

use crate::app::worker::{DuplicatePolicy, FailurePolicy, WorkerOptions};
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of config.toml for this platform.
///
/// Falls back to the current directory if platform dirs cannot be determined.
pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("", "", constants::APP_ID) {
        Some(proj_dirs) => proj_dirs.config_dir().join(constants::CONFIG_FILE_NAME),
        None => {
            tracing::warn!("Could not determine platform directories, using current directory");
            PathBuf::from(constants::CONFIG_FILE_NAME)
        }
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[reporting]` section.
    pub reporting: ReportingSection,
    /// `[worker]` section.
    pub worker: WorkerSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[reporting]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReportingSection {
    /// Base URL of the sample-metadata service. Required.
    pub url: Option<String>,
    /// Per-call timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// "drop" or "collect".
    pub failure_policy: Option<String>,
    /// Concurrent report calls per batch.
    pub parallelism: Option<usize>,
}

/// `[worker]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Suppress repeated (value, heuristic) pairs within a batch.
    pub deduplicate: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the reporting service.
    pub reporting_url: String,
    /// Per-call timeout for report calls.
    pub report_timeout: Duration,
    /// Worker behaviour.
    pub worker: WorkerOptions,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// The config file that was read, if one existed. Logged by the caller
    /// once tracing is up.
    pub source_path: Option<PathBuf>,
}

impl AppConfig {
    /// Config with defaults for everything but the required URL.
    pub fn with_url(reporting_url: impl Into<String>) -> Self {
        Self {
            reporting_url: reporting_url.into(),
            report_timeout: Duration::from_secs(constants::DEFAULT_REPORT_TIMEOUT_SECS),
            worker: WorkerOptions::default(),
            log_level: None,
            source_path: None,
        }
    }
}

// =============================================================================
// Loading and validation
// =============================================================================

/// Read and validate the config file at `path`.
///
/// `url_override` (normally from `STRINGS_SCANNER_URL`) replaces
/// `[reporting] url`. A missing file is acceptable only when an override
/// supplies the URL.
///
/// Returns the config plus non-fatal warnings for optional values that were
/// out of range and replaced with defaults.
pub fn load_config(
    path: &Path,
    url_override: Option<&str>,
) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Some(raw)
    } else {
        None
    };
    let source_path = raw.is_some().then(|| path.to_path_buf());

    let (mut config, warnings) = validate(raw.unwrap_or_default(), url_override)?;
    config.source_path = source_path;
    Ok((config, warnings))
}

/// Validate a parsed config against named constants, accumulating warnings.
pub fn validate(
    raw: RawConfig,
    url_override: Option<&str>,
) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let mut warnings: Vec<String> = Vec::new();

    // -- Reporting: url (required); a blank override does not count --
    let url = url_override
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .or(raw.reporting.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or(ConfigError::MissingField {
            field: "reporting.url",
        })?;

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            field: "reporting.url",
            value: url,
            expected: "an http:// or https:// URL",
        });
    }

    let mut config = AppConfig::with_url(url);

    // -- Reporting: timeout_secs --
    if let Some(secs) = raw.reporting.timeout_secs {
        if (constants::MIN_REPORT_TIMEOUT_SECS..=constants::MAX_REPORT_TIMEOUT_SECS)
            .contains(&secs)
        {
            config.report_timeout = Duration::from_secs(secs);
        } else {
            warnings.push(format!(
                "[reporting] timeout_secs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REPORT_TIMEOUT_SECS,
                constants::MAX_REPORT_TIMEOUT_SECS,
                constants::DEFAULT_REPORT_TIMEOUT_SECS,
            ));
        }
    }

    // -- Reporting: failure_policy --
    if let Some(ref policy) = raw.reporting.failure_policy {
        match FailurePolicy::parse(policy) {
            Some(p) => config.worker.failure_policy = p,
            None => warnings.push(format!(
                "[reporting] failure_policy = \"{policy}\" is not recognised. \
                 Expected \"drop\" or \"collect\". Using default (drop).",
            )),
        }
    }

    // -- Reporting: parallelism --
    if let Some(n) = raw.reporting.parallelism {
        if (1..=constants::MAX_REPORT_PARALLELISM).contains(&n) {
            config.worker.report_parallelism = n;
        } else {
            warnings.push(format!(
                "[reporting] parallelism = {n} is out of range (1-{}). Using default ({}).",
                constants::MAX_REPORT_PARALLELISM,
                constants::DEFAULT_REPORT_PARALLELISM,
            ));
        }
    }

    // -- Worker: deduplicate --
    if raw.worker.deduplicate == Some(true) {
        config.worker.duplicate_policy = DuplicatePolicy::Deduplicate;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    Ok((config, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(constants::CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_full_config() {
        let (_dir, path) = write_config(
            r#"
[reporting]
url = "http://aurora.local:8080"
timeout_secs = 10
failure_policy = "collect"
parallelism = 8

[worker]
deduplicate = true

[logging]
level = "DEBUG"
"#,
        );
        let (config, warnings) = load_config(&path, None).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.reporting_url, "http://aurora.local:8080");
        assert_eq!(config.report_timeout, Duration::from_secs(10));
        assert_eq!(config.worker.failure_policy, FailurePolicy::CollectAndSurface);
        assert_eq!(config.worker.duplicate_policy, DuplicatePolicy::Deduplicate);
        assert_eq!(config.worker.report_parallelism, 8);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_defaults_when_only_url_given() {
        let (_dir, path) = write_config("[reporting]\nurl = \"https://svc.example\"\n");
        let (config, warnings) = load_config(&path, None).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            config.report_timeout,
            Duration::from_secs(constants::DEFAULT_REPORT_TIMEOUT_SECS)
        );
        assert_eq!(config.worker, WorkerOptions::default());
    }

    #[test]
    fn test_missing_url_is_fatal() {
        let (_dir, path) = write_config("[worker]\ndeduplicate = true\n");
        let err = load_config(&path, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "reporting.url"
            }
        ));
    }

    #[test]
    fn test_non_http_url_is_fatal() {
        let (_dir, path) = write_config("[reporting]\nurl = \"ftp://svc\"\n");
        let err = load_config(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_override_supplies_url_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let (config, _) = load_config(&path, Some("http://override:1")).unwrap();
        assert_eq!(config.reporting_url, "http://override:1");
    }

    #[test]
    fn test_override_beats_file() {
        let (_dir, path) = write_config("[reporting]\nurl = \"http://file\"\n");
        let (config, _) = load_config(&path, Some("http://env")).unwrap();
        assert_eq!(config.reporting_url, "http://env");
    }

    #[test]
    fn test_blank_override_falls_back_to_file() {
        let (_dir, path) = write_config("[reporting]\nurl = \"http://file\"\n");
        for blank in ["", "   "] {
            let (config, _) = load_config(&path, Some(blank)).unwrap();
            assert_eq!(config.reporting_url, "http://file");
        }
    }

    #[test]
    fn test_blank_override_without_file_is_missing_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load_config(&path, Some(" ")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "reporting.url"
            }
        ));
    }

    #[test]
    fn test_source_path_records_the_file_read() {
        let (_dir, path) = write_config("[reporting]\nurl = \"http://file\"\n");
        let (config, _) = load_config(&path, None).unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));

        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let (config, _) = load_config(&absent, Some("http://env")).unwrap();
        assert!(config.source_path.is_none());
    }

    #[test]
    fn test_out_of_range_values_warn_and_default() {
        let (_dir, path) = write_config(
            r#"
[reporting]
url = "http://svc"
timeout_secs = 0
failure_policy = "retry"
parallelism = 1000

[logging]
level = "loud"
"#,
        );
        let (config, warnings) = load_config(&path, None).unwrap();
        assert_eq!(warnings.len(), 4, "warnings: {warnings:?}");
        assert_eq!(config.worker, WorkerOptions::default());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_unparseable_file_is_fatal() {
        let (_dir, path) = write_config("[reporting\nurl = ");
        assert!(matches!(
            load_config(&path, None),
            Err(ConfigError::TomlParse { .. })
        ));
    }
}
