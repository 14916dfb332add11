use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use expense_core::config::{AnalysisConfig, LoggingConfig};

/// Name of the log file created under `paths.logs`.
pub const LOG_FILE_NAME: &str = "expense_analysis.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Create the output directory, and the log directory when file logging is
/// enabled, including any missing parents.
pub fn ensure_directories(config: &AnalysisConfig) -> anyhow::Result<()> {
    let output = &config.paths.default_output;
    std::fs::create_dir_all(output)
        .with_context(|| format!("cannot create output directory {}", output.display()))?;

    if config.logging.log_to_file {
        let logs = &config.paths.logs;
        std::fs::create_dir_all(logs)
            .with_context(|| format!("cannot create log directory {}", logs.display()))?;
    }
    Ok(())
}

/// Path of the log file inside `logs_dir`.
pub fn log_file_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join(LOG_FILE_NAME)
}

/// Notice for a configuration file that does not exist and was replaced by
/// defaults. Config loading runs before the subscriber is installed, so the
/// caller logs this once logging is up.
pub fn missing_config_notice(path: &Path) -> Option<String> {
    (!path.exists()).then(|| {
        format!(
            "Configuration file not found: {}. Using defaults.",
            path.display()
        )
    })
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a configured level name to an [`EnvFilter`] directive.
///
/// `CRITICAL` has no tracing counterpart and maps to `error`. Unknown names
/// pass through unchanged so that `EnvFilter` can reject them.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Console output goes to stderr so it never interleaves with the report on
/// stdout. With `log_to_file` set, a second plain-text layer appends to
/// `<logs_dir>/expense_analysis.log`. Falls back to `"info"` if the level
/// string is not recognised.
pub fn setup_logging(logging: &LoggingConfig, logs_dir: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = logging.log_to_console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
    });

    let file = if logging.log_to_file {
        let path = log_file_path(logs_dir);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
