//! Plain-text report printed at the end of a successful run.

use std::fmt::Write;

use expense_core::error::{ExpenseError, Result};
use expense_core::models::{ExtremeExpense, IssueAction};

use crate::renderer::{column_width, pad_left, pad_right, Renderer, ReportView};

const RULE_WIDTH: usize = 60;
const LABEL_WIDTH: usize = 20;

/// Section-by-section text report: loaded data, analysis, validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

impl ConsoleReport {
    pub fn new() -> Self {
        Self
    }

    fn loaded_data(&self, out: &mut String, view: &ReportView<'_>) -> std::fmt::Result {
        let summary = view.summary;
        heading(out, "LOADED DATA SUMMARY")?;
        field(out, "Records", &summary.record_count.to_string())?;
        field(
            out,
            "Period",
            &format!(
                "{} to {}",
                view.date(summary.date_range.start),
                view.date(summary.date_range.end)
            ),
        )?;
        let categories = summary.categories();
        field(
            out,
            "Categories",
            &format!("{} ({})", categories.len(), categories.join(", ")),
        )?;
        field(out, "Total", &view.money(summary.total_spent))?;
        field(out, "Average expense", &view.money(summary.average_expense))
    }

    fn analysis(&self, out: &mut String, view: &ReportView<'_>) -> std::fmt::Result {
        let summary = view.summary;
        heading(out, "COMPLETE ANALYSIS")?;
        field(out, "Total spent", &view.money(summary.total_spent))?;
        field(out, "Monthly average", &view.money(summary.monthly_average))?;
        field(out, "Largest expense", &extreme(view, &summary.max_expense))?;
        field(out, "Smallest expense", &extreme(view, &summary.min_expense))?;

        writeln!(out)?;
        let name_width = column_width(
            summary.by_category.iter().map(|c| c.category.as_str()),
            "Category".len(),
        );
        let totals: Vec<String> = summary
            .by_category
            .iter()
            .map(|c| view.money(c.total))
            .collect();
        let shares: Vec<String> = summary
            .by_category
            .iter()
            .map(|c| view.percent(c.percentage_of_total))
            .collect();
        let total_width = column_width(totals.iter().map(String::as_str), "Total".len());
        let share_width = column_width(shares.iter().map(String::as_str), "Share".len());

        writeln!(
            out,
            "{}  {}  {}  {}",
            pad_right("Category", name_width),
            pad_left("Total", total_width),
            pad_left("Share", share_width),
            pad_left("Count", 5)
        )?;
        for ((category, total), share) in summary.by_category.iter().zip(&totals).zip(&shares) {
            writeln!(
                out,
                "{}  {}  {}  {}",
                pad_right(&category.category, name_width),
                pad_left(total, total_width),
                pad_left(share, share_width),
                pad_left(&category.count.to_string(), 5)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Monthly totals")?;
        for month in &summary.monthly_totals {
            writeln!(
                out,
                "  {}  {}  ({} records)",
                month.label(),
                pad_left(&view.money(month.total), total_width),
                month.count
            )?;
        }
        Ok(())
    }

    fn validation(&self, out: &mut String, view: &ReportView<'_>) -> std::fmt::Result {
        let report = view.report;
        heading(out, "VALIDATION")?;
        field(out, "Disposition", &report.disposition().to_string())?;
        field(out, "Rows checked", &report.rows_checked().to_string())?;
        field(out, "Records accepted", &report.records_accepted().to_string())?;
        field(out, "Rows excluded", &report.excluded_rows().to_string())?;
        field(out, "Warnings", &report.warning_count().to_string())?;

        if report.issues().is_empty() {
            return Ok(());
        }
        writeln!(out)?;
        for issue in report.issues() {
            let action = match issue.action {
                IssueAction::Excluded => "excluded",
                IssueAction::Flagged => "kept",
            };
            writeln!(
                out,
                "  row {}: {}: {} [{}]",
                issue.row, issue.kind, issue.message, action
            )?;
        }
        Ok(())
    }
}

impl Renderer for ConsoleReport {
    fn render(&self, view: &ReportView<'_>) -> Result<String> {
        let mut out = String::new();
        self.loaded_data(&mut out, view)
            .and_then(|_| self.analysis(&mut out, view))
            .and_then(|_| self.validation(&mut out, view))
            .map_err(|e| ExpenseError::Io(std::io::Error::other(e)))?;
        Ok(out)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn heading(out: &mut String, title: &str) -> std::fmt::Result {
    if !out.is_empty() {
        writeln!(out)?;
    }
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{rule}")
}

fn field(out: &mut String, label: &str, value: &str) -> std::fmt::Result {
    writeln!(out, "{}{}", pad_right(&format!("{label}:"), LABEL_WIDTH), value)
}

fn extreme(view: &ReportView<'_>, expense: &ExtremeExpense) -> String {
    let record = &expense.record;
    let mut text = format!(
        "{} on {} ({}",
        view.money(expense.amount),
        view.date(record.date()),
        record.category()
    );
    if !record.description().is_empty() {
        text.push_str(": ");
        text.push_str(record.description());
    }
    text.push(')');
    text
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixtures::sample_outcome;
    use expense_core::config::AnalysisConfig;
    use expense_data::pipeline::run_pipeline_from_reader;

    fn render(report: ConsoleReport) -> String {
        let config = AnalysisConfig::default();
        let outcome = sample_outcome(&config);
        let view = ReportView::new(&outcome.summary, &outcome.records, &outcome.report, &config);
        report.render(&view).unwrap()
    }

    fn render_csv(csv: &str) -> String {
        let config = AnalysisConfig::default();
        let outcome = run_pipeline_from_reader(csv.as_bytes(), &config).unwrap();
        let view = ReportView::new(&outcome.summary, &outcome.records, &outcome.report, &config);
        ConsoleReport::new().render(&view).unwrap()
    }

    #[test]
    fn test_console_sections_present() {
        let text = render(ConsoleReport::new());
        assert!(text.contains("LOADED DATA SUMMARY"));
        assert!(text.contains("COMPLETE ANALYSIS"));
        assert!(text.contains("VALIDATION"));
    }

    #[test]
    fn test_console_headline_figures() {
        let text = render(ConsoleReport::new());
        assert!(text.contains("Records:            3"));
        assert!(text.contains("Period:             01/01/2024 to 01/03/2024"));
        assert!(text.contains("Categories:         2 (Food, Transport)"));
        assert!(text.contains("Total spent:        $100.00"));
        assert!(text.contains("$50.00 on 01/01/2024 (Food: Lunch)"));
    }

    #[test]
    fn test_console_category_table_aligned() {
        let text = render(ConsoleReport::new());
        let food = text.lines().find(|l| l.starts_with("Food ")).unwrap();
        let transport = text.lines().find(|l| l.starts_with("Transport")).unwrap();
        assert_eq!(food.len(), transport.len());
        assert!(food.contains("$70.00"));
        assert!(food.contains("70.00%"));
        assert!(transport.ends_with('1'));
    }

    #[test]
    fn test_console_lists_issues() {
        let text = render(ConsoleReport::new());
        assert!(text.contains("Disposition:        accepted_with_warnings"));
        assert!(text.contains("row 4: amount out of range"));
        assert!(text.contains("[excluded]"));
    }

    #[test]
    fn test_console_counts_match_issue_lines() {
        let text = render(ConsoleReport::new());
        assert!(text.contains("Rows excluded:      1"));
        assert_eq!(text.lines().filter(|l| l.starts_with("  row ")).count(), 1);
    }

    #[test]
    fn test_console_clean_input_has_no_issue_lines() {
        let text = render_csv(
            "Date,Category,Amount,Description\n\
             2024-01-01,Food,50.00,Lunch\n",
        );
        assert!(text.contains("Disposition:        accepted"));
        assert!(text.contains("Rows excluded:      0"));
        assert!(!text.contains("  row "));
    }
}
