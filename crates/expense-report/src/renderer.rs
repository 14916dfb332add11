use chrono::NaiveDate;
use rust_decimal::Decimal;
use unicode_width::UnicodeWidthStr;

use expense_core::config::AnalysisConfig;
use expense_core::error::Result;
use expense_core::formatting::{format_currency, format_date, format_percentage};
use expense_core::models::{AnalysisSummary, RecordSet, ValidationReport};

// ── ReportView ────────────────────────────────────────────────────────────────

/// Read-only borrow of everything a renderer may show.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    pub summary: &'a AnalysisSummary,
    pub records: &'a RecordSet,
    pub report: &'a ValidationReport,
    pub config: &'a AnalysisConfig,
}

impl<'a> ReportView<'a> {
    pub fn new(
        summary: &'a AnalysisSummary,
        records: &'a RecordSet,
        report: &'a ValidationReport,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            summary,
            records,
            report,
            config,
        }
    }

    /// Amount with the configured currency symbol and precision.
    pub fn money(&self, amount: Decimal) -> String {
        let analysis = &self.config.analysis;
        format_currency(amount, &analysis.currency_symbol, analysis.currency_precision)
    }

    /// Date in the configured display pattern.
    pub fn date(&self, date: NaiveDate) -> String {
        format_date(date, &self.config.analysis.output_date_format)
    }

    pub fn percent(&self, value: Decimal) -> String {
        format_percentage(value, self.config.analysis.currency_precision)
    }
}

// ── Renderer ──────────────────────────────────────────────────────────────────

/// Anything that turns an analysis result into presentable text.
pub trait Renderer {
    fn render(&self, view: &ReportView<'_>) -> Result<String>;
}

// ── Text helpers ──────────────────────────────────────────────────────────────

/// Left-align `text` in a field `width` terminal columns wide.
pub(crate) fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Right-align `text` in a field `width` terminal columns wide.
pub(crate) fn pad_left(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", " ".repeat(fill), text)
}

/// Widest entry in display columns, at least `min`.
pub(crate) fn column_width<'s>(cells: impl IntoIterator<Item = &'s str>, min: usize) -> usize {
    cells.into_iter().map(UnicodeWidthStr::width).fold(min, usize::max)
}

// ── Test fixtures ─────────────────────────────────────────────────────────────
