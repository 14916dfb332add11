mod bootstrap;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use expense_core::config::AnalysisConfig;
use expense_core::error::ExpenseError;
use expense_core::settings::Settings;
use expense_data::pipeline::run_pipeline;
use expense_report::{BarChart, ConsoleReport, Renderer, ReportView, SummaryWriter};

fn main() -> ExitCode {
    let settings = Settings::parse();

    match start(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ExpenseError>() {
                Some(e) => eprintln!("Error in {} stage: {:#}", e.stage(), err),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

/// Load configuration, install logging, then run the analysis.
fn start(settings: &Settings) -> Result<()> {
    let file_config = AnalysisConfig::load(Some(settings.config.as_path()))?;
    let config = settings.apply_to(&file_config);
    config.validate()?;

    bootstrap::ensure_directories(&config)?;
    bootstrap::setup_logging(&config.logging, &config.paths.logs)?;
    if let Some(notice) = bootstrap::missing_config_notice(&settings.config) {
        warn!("{notice}");
    }

    info!("Expense Analyzer v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Input: {}, output: {}",
        config.paths.default_input.display(),
        config.paths.default_output.display()
    );

    let written = analyze(&config)?;
    println!("Summary saved to {}", written.display());
    Ok(())
}

/// Pipeline, console report, JSON summary and optional charts. Returns the
/// path of the written summary.
fn analyze(config: &AnalysisConfig) -> Result<PathBuf> {
    let outcome = run_pipeline(&config.paths.default_input, config)?;
    let view = ReportView::new(&outcome.summary, &outcome.records, &outcome.report, config);

    println!("{}", ConsoleReport::new().render(&view)?);

    let written = SummaryWriter::new(&config.paths.default_output, config).write(&view)?;

    if config.visualization.show_plots {
        println!("{}", BarChart::from_config(&config.visualization).render(&view)?);
    }

    let meta = &outcome.metadata;
    info!(
        "Finished: {} rows read, {} records analysed in {:.3}s",
        meta.rows_read,
        meta.records_validated,
        meta.load_time_seconds + meta.validate_time_seconds + meta.aggregate_time_seconds
    );
    Ok(written)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir, csv: &str) -> AnalysisConfig {
        let input = tmp.path().join("expenses.csv");
        std::fs::write(&input, csv).expect("write input");

        let mut config = AnalysisConfig::default();
        config.paths.default_input = input;
        config.paths.default_output = tmp.path().join("output");
        config.output.use_timestamp = false;
        config
    }

    #[test]
    fn test_analyze_writes_summary() {
        let tmp = TempDir::new().expect("tempdir");
        let mut config = config_in(
            &tmp,
            "Date,Category,Amount,Description\n\
             2024-01-01,Food,50.00,Lunch\n\
             2024-01-02,Transport,30.00,Gas\n",
        );
        config.visualization.show_plots = true;

        let written = analyze(&config).expect("analyze should succeed");
        assert_eq!(written, tmp.path().join("output").join("expense_summary.json"));
        assert!(written.is_file());
    }

    #[test]
    fn test_analyze_reports_stage_on_failure() {
        let tmp = TempDir::new().expect("tempdir");
        let config = config_in(&tmp, "Date,Amount\n2024-01-01,5\n");

        let err = analyze(&config).unwrap_err();
        let expense = err.downcast_ref::<ExpenseError>().expect("expense error");
        assert_eq!(expense.stage(), "reader");
        assert!(!tmp.path().join("output").exists());
    }

    #[test]
    fn test_analyze_missing_input() {
        let tmp = TempDir::new().expect("tempdir");
        let mut config = config_in(&tmp, "");
        config.paths.default_input = tmp.path().join("missing.csv");

        let err = analyze(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExpenseError>(),
            Some(ExpenseError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_settings_override_config() {
        let settings = Settings::parse_from(["expense-analyzer", "-o", "elsewhere"]);
        let config = settings.apply_to(&AnalysisConfig::default());
        assert_eq!(config.paths.default_output, PathBuf::from("elsewhere"));
    }
}
