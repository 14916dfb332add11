//! JSON export of the analysis summary.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

use expense_core::config::AnalysisConfig;
use expense_core::error::Result;
use expense_core::models::{AnalysisSummary, ValidationReport};

use crate::renderer::{Renderer, ReportView};

const FILE_STEM: &str = "expense_summary";

/// Shape of the exported document.
#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    records_analyzed: usize,
    currency_symbol: &'a str,
    summary: &'a AnalysisSummary,
    validation: &'a ValidationReport,
}

/// Writes `expense_summary[_<timestamp>].json` into an output directory.
#[derive(Debug, Clone)]
pub struct SummaryWriter {
    output_dir: PathBuf,
    use_timestamp: bool,
    timestamp_format: String,
}

impl SummaryWriter {
    pub fn new(output_dir: impl Into<PathBuf>, config: &AnalysisConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            use_timestamp: config.output.use_timestamp,
            timestamp_format: config.output.timestamp_format.clone(),
        }
    }

    /// File name for a run finishing at `now`.
    pub fn file_name(&self, now: DateTime<Local>) -> String {
        if self.use_timestamp {
            format!("{}_{}.json", FILE_STEM, now.format(&self.timestamp_format))
        } else {
            format!("{}.json", FILE_STEM)
        }
    }

    /// Render `view` and atomically write it, returning the written path.
    pub fn write(&self, view: &ReportView<'_>) -> Result<PathBuf> {
        let json = self.render(view)?;
        let path = self.output_dir.join(self.file_name(Local::now()));

        std::fs::create_dir_all(&self.output_dir)?;
        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &path)?;

        info!("Summary written to {}", path.display());
        Ok(path)
    }
}

impl Renderer for SummaryWriter {
    fn render(&self, view: &ReportView<'_>) -> Result<String> {
        let document = SummaryDocument {
            records_analyzed: view.records.len(),
            currency_symbol: &view.config.analysis.currency_symbol,
            summary: view.summary,
            validation: view.report,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixtures::sample_outcome;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_with_timestamp() {
        let config = AnalysisConfig::default();
        let writer = SummaryWriter::new("out", &config);
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(writer.file_name(now), "expense_summary_20240305_140709.json");
    }

    #[test]
    fn test_file_name_without_timestamp() {
        let mut config = AnalysisConfig::default();
        config.output.use_timestamp = false;
        let writer = SummaryWriter::new("out", &config);
        assert_eq!(writer.file_name(Local::now()), "expense_summary.json");
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let tmp = TempDir::new().unwrap();
        let mut config = AnalysisConfig::default();
        config.output.use_timestamp = false;
        let outcome = sample_outcome(&config);
        let view = ReportView::new(&outcome.summary, &outcome.records, &outcome.report, &config);

        let dir = tmp.path().join("nested").join("output");
        let path = SummaryWriter::new(&dir, &config).write(&view).unwrap();

        assert_eq!(path, dir.join("expense_summary.json"));
        assert!(!dir.join("expense_summary.json.tmp").exists());

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["records_analyzed"], 3);
        assert_eq!(json["summary"]["record_count"], 3);
        assert_eq!(json["validation"]["disposition"], "accepted_with_warnings");
    }

    #[test]
    fn test_render_round_trips_summary() {
        let config = AnalysisConfig::default();
        let outcome = sample_outcome(&config);
        let view = ReportView::new(&outcome.summary, &outcome.records, &outcome.report, &config);

        let text = SummaryWriter::new("unused", &config).render(&view).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let summary: AnalysisSummary = serde_json::from_value(json["summary"].clone()).unwrap();
        assert_eq!(summary, outcome.summary);
    }
}
