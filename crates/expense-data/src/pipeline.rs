//! End-to-end pipeline: read, validate, aggregate.
//!
//! Returns a [`PipelineOutcome`] ready for whichever renderer the caller
//! picks. Stages run strictly in order and each consumes only the previous
//! stage's output.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use expense_core::config::AnalysisConfig;
use expense_core::error::Result;
use expense_core::models::{AnalysisSummary, RecordSet, ValidationReport};

use crate::aggregator::ExpenseAggregator;
use crate::reader::{parse_expenses, read_expenses, ReadOutcome};
use crate::validator::RecordValidator;

// ── Public types ──────────────────────────────────────────────────────────────

/// Bookkeeping produced alongside the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    /// RFC 3339 timestamp when this run finished.
    pub generated_at: String,
    /// Data rows encountered by the reader.
    pub rows_read: usize,
    /// Rows the reader could not coerce.
    pub parse_failures: usize,
    /// Records that survived validation.
    pub records_validated: usize,
    pub load_time_seconds: f64,
    pub validate_time_seconds: f64,
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub summary: AnalysisSummary,
    /// Validated records, ascending by date.
    pub records: RecordSet,
    pub report: ValidationReport,
    pub metadata: PipelineMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the pipeline over the file at `path`.
///
/// 1. Read and coerce rows.
/// 2. Validate; a rejected batch stops here with a validation error.
/// 3. Aggregate the surviving records.
pub fn run_pipeline(path: &Path, config: &AnalysisConfig) -> Result<PipelineOutcome> {
    info!("Loading expenses from {}", path.display());
    let load_start = Instant::now();
    let outcome = read_expenses(path, config)?;
    let load_time = load_start.elapsed().as_secs_f64();

    finish(outcome, load_time, config)
}

/// Same as [`run_pipeline`] but reads from an arbitrary byte stream.
pub fn run_pipeline_from_reader<R: Read>(
    input: R,
    config: &AnalysisConfig,
) -> Result<PipelineOutcome> {
    let load_start = Instant::now();
    let outcome = parse_expenses(input, config)?;
    let load_time = load_start.elapsed().as_secs_f64();

    finish(outcome, load_time, config)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn finish(
    outcome: ReadOutcome,
    load_time: f64,
    config: &AnalysisConfig,
) -> Result<PipelineOutcome> {
    info!(
        "Read {} rows: {} records, {} parse failures",
        outcome.rows_read,
        outcome.records.len(),
        outcome.failures.len()
    );

    // ── Validate ──────────────────────────────────────────────────────────────
    let validate_start = Instant::now();
    let validated = RecordValidator::new(config).validate(&outcome)?;
    let validate_time = validate_start.elapsed().as_secs_f64();

    if validated.report.is_rejected() {
        warn!(
            "Validation rejected all {} rows",
            validated.report.rows_checked()
        );
    }
    let validated = validated.into_accepted()?;
    info!(
        "Validation {}: {} records kept",
        validated.report.disposition(),
        validated.records.len()
    );

    // ── Aggregate ─────────────────────────────────────────────────────────────
    let aggregate_start = Instant::now();
    let summary =
        ExpenseAggregator::summarize(&validated.records, config.analysis.currency_precision)?;
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    info!(
        "Analysis complete: {} records, total {}",
        summary.record_count, summary.total_spent
    );

    let metadata = PipelineMetadata {
        generated_at: Utc::now().to_rfc3339(),
        rows_read: outcome.rows_read,
        parse_failures: outcome.failures.len(),
        records_validated: validated.records.len(),
        load_time_seconds: load_time,
        validate_time_seconds: validate_time,
        aggregate_time_seconds: aggregate_time,
    };

    Ok(PipelineOutcome {
        summary,
        records: validated.records,
        report: validated.report,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
