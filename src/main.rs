// strings-scanner - main.rs
//
// Local driver. Handles:
// 1. CLI argument parsing
// 2. Config loading (required reporting URL)
// 3. Logging initialisation
// 4. Heuristic table compilation (startup-fatal on error)
// 5. Consuming JSON-lines tasks from a file or stdin

use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use strings_scanner::app::consumer::{read_tasks_jsonl, RunSummary, TaskConsumer};
use strings_scanner::app::reporter::HttpReporter;
use strings_scanner::app::worker::StringClassificationWorker;
use strings_scanner::core::heuristics::HeuristicSet;
use strings_scanner::platform::config::{self, AppConfig};
use strings_scanner::util::error::{ConfigError, Result, ScannerError};
use strings_scanner::util::{constants, logging};

/// Exit code when configuration or the heuristic table is unusable.
const EXIT_STARTUP_FAILURE: u8 = 2;

/// Exit code when at least one task failed.
const EXIT_TASK_FAILURE: u8 = 1;

/// strings-scanner - classify extracted sample strings and report matches.
///
/// Reads one JSON task per line:
/// {"headers": {"type": "feature", "stage": "raw", "kind": "strings"},
///  "payload": {"sha256": "<sample hash>", "data": ["...", "..."]}}
#[derive(Parser, Debug)]
#[command(name = "strings-scanner", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Read tasks from this file instead of stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let url_override = std::env::var(constants::URL_ENV_VAR).ok();

    // Config is loaded before logging so its level can apply; errors are
    // reported once logging is up.
    let loaded = config::load_config(&config_path, url_override.as_deref());
    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|(c, _)| c.log_level.clone());
    logging::init(cli.debug, config_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        identity = constants::WORKER_IDENTITY,
        debug = cli.debug,
        "strings-scanner starting"
    );

    match run(&cli, &config_path, loaded) {
        Ok(summary) if summary.failed > 0 => ExitCode::from(EXIT_TASK_FAILURE),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_STARTUP_FAILURE)
        }
    }
}

/// Everything after logging init. An `Err` means the worker never started
/// consuming tasks; per-task failures are counted in the summary instead.
fn run(
    cli: &Cli,
    config_path: &Path,
    loaded: std::result::Result<(AppConfig, Vec<String>), ConfigError>,
) -> Result<RunSummary> {
    let (app_config, warnings) = loaded?;
    match app_config.source_path {
        Some(ref path) => tracing::info!(path = %path.display(), "Loaded config.toml"),
        None => tracing::debug!(
            path = %config_path.display(),
            "No config.toml found; using defaults"
        ),
    }
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let heuristics = Arc::new(HeuristicSet::builtin()?);

    let reporter = HttpReporter::new(&app_config.reporting_url, app_config.report_timeout);
    let worker = StringClassificationWorker::with_options(heuristics, reporter, app_config.worker);
    let consumer = TaskConsumer::new(worker);

    tracing::info!(
        url = %app_config.reporting_url,
        timeout_secs = app_config.report_timeout.as_secs(),
        "Ready to consume tasks"
    );

    let summary = match cli.input {
        Some(ref path) => {
            let file = File::open(path).map_err(|e| ScannerError::Io {
                path: path.clone(),
                operation: "open task input",
                source: e,
            })?;
            consumer.run(read_tasks_jsonl(BufReader::new(file)))
        }
        None => consumer.run(read_tasks_jsonl(io::stdin().lock())),
    };
    Ok(summary)
}
