use clap::Parser;
use std::path::PathBuf;

use crate::config::{AnalysisConfig, LOG_LEVELS};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Personal expense analysis pipeline
#[derive(Parser, Debug, Clone)]
#[command(
    name = "expense-analyzer",
    about = "Validate, clean and summarise personal expense records",
    version
)]
pub struct Settings {
    /// Path to input CSV file (default: from config)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Path to output directory for generated files (default: from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration JSON file
    #[arg(short, long, default_value = "config/config.json")]
    pub config: PathBuf,

    /// Logging level (default: from config)
    #[arg(long, value_parser = LOG_LEVELS)]
    pub log_level: Option<String>,

    /// Print charts to the terminal
    #[arg(long)]
    pub show_plots: bool,
}

impl Settings {
    /// Return a copy of `config` with command-line overrides applied.
    ///
    /// The command line always wins over the configuration file.
    pub fn apply_to(&self, config: &AnalysisConfig) -> AnalysisConfig {
        let mut merged = config.clone();
        if let Some(level) = &self.log_level {
            merged.logging.level = level.clone();
        }
        if self.show_plots {
            merged.visualization.show_plots = true;
        }
        if let Some(input) = &self.input {
            merged.paths.default_input = input.clone();
        }
        if let Some(output) = &self.output {
            merged.paths.default_output = output.clone();
        }
        merged
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
