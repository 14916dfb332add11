//! Horizontal bar charts drawn with block characters.

use std::fmt::Write;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use expense_core::config::VisualizationConfig;
use expense_core::error::{ExpenseError, Result};

use crate::renderer::{column_width, pad_left, pad_right, Renderer, ReportView};

/// Spend by category and spend by month, one bar per line.
#[derive(Debug, Clone, Copy)]
pub struct BarChart {
    /// Columns of the longest bar.
    pub width: usize,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for BarChart {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

impl BarChart {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            width: config.bar_width,
            ..Self::default()
        }
    }

    /// A bar of `self.width` columns filled in proportion to `value / max`.
    /// Non-positive values and maxima draw an empty bar.
    pub fn bar(&self, value: Decimal, max: Decimal) -> String {
        let filled = if max > Decimal::ZERO && value > Decimal::ZERO {
            (value.min(max) / max * Decimal::from(self.width))
                .round()
                .to_usize()
                .unwrap_or(0)
                .min(self.width)
        } else {
            0
        };
        let empty = self.width - filled;

        let mut bar = String::with_capacity(self.width * 3);
        bar.extend(std::iter::repeat(self.filled_char).take(filled));
        bar.extend(std::iter::repeat(self.empty_char).take(empty));
        bar
    }

    fn chart(
        &self,
        out: &mut String,
        title: &str,
        rows: &[(String, Decimal, String)],
    ) -> std::fmt::Result {
        writeln!(out, "{title}")?;
        let max = rows
            .iter()
            .map(|(_, value, _)| *value)
            .max()
            .unwrap_or(Decimal::ZERO);
        let label_width = column_width(rows.iter().map(|(label, _, _)| label.as_str()), 0);
        let value_width = column_width(rows.iter().map(|(_, _, shown)| shown.as_str()), 0);
        for (label, value, shown) in rows {
            writeln!(
                out,
                "  {} {} {}",
                pad_right(label, label_width),
                self.bar(*value, max),
                pad_left(shown, value_width)
            )?;
        }
        Ok(())
    }
}

impl Renderer for BarChart {
    fn render(&self, view: &ReportView<'_>) -> Result<String> {
        let summary = view.summary;
        let by_category: Vec<(String, Decimal, String)> = summary
            .by_category
            .iter()
            .map(|c| {
                let shown = format!(
                    "{} ({})",
                    view.money(c.total),
                    view.percent(c.percentage_of_total)
                );
                (c.category.clone(), c.total, shown)
            })
            .collect();
        let by_month: Vec<(String, Decimal, String)> = summary
            .monthly_totals
            .iter()
            .map(|m| (m.label(), m.total, view.money(m.total)))
            .collect();

        let mut out = String::new();
        self.chart(&mut out, "Spending by category", &by_category)
            .and_then(|_| writeln!(out))
            .and_then(|_| self.chart(&mut out, "Spending by month", &by_month))
            .map_err(|e| ExpenseError::Io(std::io::Error::other(e)))?;
        Ok(out)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixtures::sample_outcome;
    use expense_core::config::AnalysisConfig;
    use rust_decimal_macros::dec;

    fn chart(width: usize) -> BarChart {
        BarChart {
            width,
            ..BarChart::default()
        }
    }

    // ── bar ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_bar_full_and_empty() {
        let c = chart(4);
        assert_eq!(c.bar(dec!(10), dec!(10)), "████");
        assert_eq!(c.bar(dec!(0), dec!(10)), "░░░░");
    }

    #[test]
    fn test_bar_proportional() {
        let c = chart(10);
        assert_eq!(c.bar(dec!(30), dec!(70)), "████░░░░░░");
        assert_eq!(c.bar(dec!(70), dec!(70)).chars().count(), 10);
    }

    #[test]
    fn test_bar_zero_max_is_empty() {
        assert_eq!(chart(3).bar(dec!(0), dec!(0)), "░░░");
        assert_eq!(chart(3).bar(dec!(-5), dec!(10)), "░░░");
    }

    #[test]
    fn test_bar_at_decimal_limits() {
        let c = chart(10);
        assert_eq!(c.bar(Decimal::MAX, Decimal::MAX), "██████████");
        assert_eq!(c.bar(Decimal::MAX / dec!(2), Decimal::MAX), "█████░░░░░");
    }

    // ── render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_both_charts() {
        let mut config = AnalysisConfig::default();
        config.visualization.bar_width = 10;
        let outcome = sample_outcome(&config);
        let view = ReportView::new(&outcome.summary, &outcome.records, &outcome.report, &config);

        let text = BarChart::from_config(&config.visualization)
            .render(&view)
            .unwrap();
        assert!(text.contains("Spending by category"));
        assert!(text.contains("Spending by month"));

        let food = text.lines().find(|l| l.contains("Food")).unwrap();
        assert!(food.contains("██████████"));
        assert!(food.contains("$70.00 (70.00%)"));
        let transport = text.lines().find(|l| l.contains("Transport")).unwrap();
        assert!(transport.contains("████░░░░░░"));
        assert!(text.contains("2024-01"));
    }
}
