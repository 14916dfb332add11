//! Summary statistics over a validated record set.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::debug;

use expense_core::error::{ExpenseError, Result};
use expense_core::models::{
    AnalysisSummary, CategoryBreakdown, DateRange, ExpenseRecord, ExtremeExpense, MonthlyTotal,
    RecordSet,
};

// ── CategoryStats ─────────────────────────────────────────────────────────────

/// Running total and record count for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub total: Decimal,
    pub count: usize,
}

impl CategoryStats {
    /// Add a single record's amount to the running totals.
    pub fn add_record(&mut self, record: &ExpenseRecord) -> Result<()> {
        self.total = self
            .total
            .checked_add(record.amount())
            .ok_or(ExpenseError::AmountOverflow("group total"))?;
        self.count += 1;
        Ok(())
    }
}

// ── ExpenseAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that turns a record set into an [`AnalysisSummary`].
pub struct ExpenseAggregator;

impl ExpenseAggregator {
    /// Compute the full summary. Percentages are rounded to `precision`
    /// decimal places; every other figure is exact.
    ///
    /// Fails with [`ExpenseError::EmptyDataset`] when `records` is empty and
    /// with [`ExpenseError::AmountOverflow`] when a sum leaves the decimal
    /// range.
    pub fn summarize(records: &RecordSet, precision: u32) -> Result<AnalysisSummary> {
        let date_range = records.date_range().ok_or(ExpenseError::EmptyDataset)?;
        let (max_expense, min_expense) =
            Self::extremes(records.records()).ok_or(ExpenseError::EmptyDataset)?;

        let total_spent = records
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.amount()))
            .ok_or(ExpenseError::AmountOverflow("total_spent"))?;
        let record_count = records.len();
        let months = date_range.months_spanned();

        let summary = AnalysisSummary {
            total_spent,
            record_count,
            date_range,
            monthly_average: total_spent / Decimal::from(months),
            average_expense: total_spent / Decimal::from(record_count),
            max_expense,
            min_expense,
            by_category: Self::category_breakdown(records, total_spent, precision)?,
            monthly_totals: Self::monthly_totals(records, date_range)?,
        };

        debug!(
            "Aggregated {} records: total={}, {} categories over {} months",
            record_count,
            total_spent,
            summary.by_category.len(),
            months
        );
        Ok(summary)
    }

    /// Group records by exact category name. Keys are sorted alphabetically.
    pub fn aggregate_by_category(records: &RecordSet) -> Result<BTreeMap<String, CategoryStats>> {
        let mut groups: BTreeMap<String, CategoryStats> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.category().to_string())
                .or_default()
                .add_record(record)?;
        }
        Ok(groups)
    }

    /// Per-category totals ordered by descending total, ties alphabetical.
    pub fn category_breakdown(
        records: &RecordSet,
        total_spent: Decimal,
        precision: u32,
    ) -> Result<Vec<CategoryBreakdown>> {
        let mut breakdown: Vec<CategoryBreakdown> = Self::aggregate_by_category(records)?
            .into_iter()
            .map(|(category, stats)| {
                Ok(CategoryBreakdown {
                    percentage_of_total: share_of(stats.total, total_spent, precision)?,
                    category,
                    total: stats.total,
                    count: stats.count,
                })
            })
            .collect::<Result<_>>()?;

        breakdown.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(breakdown)
    }

    /// One entry per calendar month in `range`, ascending. Months without
    /// records carry a zero total.
    pub fn monthly_totals(records: &RecordSet, range: DateRange) -> Result<Vec<MonthlyTotal>> {
        let mut by_month: BTreeMap<(i32, u32), CategoryStats> = BTreeMap::new();
        for record in records {
            let date = record.date();
            by_month
                .entry((date.year(), date.month()))
                .or_default()
                .add_record(record)?;
        }

        let (mut year, mut month) = (range.start.year(), range.start.month());
        let mut totals = Vec::with_capacity(range.months_spanned() as usize);
        for _ in 0..range.months_spanned() {
            let stats = by_month.get(&(year, month)).copied().unwrap_or_default();
            totals.push(MonthlyTotal {
                year,
                month,
                total: stats.total,
                count: stats.count,
            });
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        Ok(totals)
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Largest and smallest expense. Ties go to the earliest date, then to
    /// the earliest row.
    fn extremes(records: &[ExpenseRecord]) -> Option<(ExtremeExpense, ExtremeExpense)> {
        let earlier_first = |a: &ExpenseRecord, b: &ExpenseRecord| -> Ordering {
            (a.date(), a.row()).cmp(&(b.date(), b.row()))
        };

        let max = records.iter().max_by(|a, b| {
            a.amount()
                .cmp(&b.amount())
                .then_with(|| earlier_first(b, a))
        })?;
        let min = records.iter().min_by(|a, b| {
            a.amount()
                .cmp(&b.amount())
                .then_with(|| earlier_first(a, b))
        })?;

        Some((extreme(max), extreme(min)))
    }
}

/// Allowed deviation of the summed category percentages from 100 when each
/// of `categories` shares is rounded to `precision` places.
pub fn percentage_tolerance(categories: usize, precision: u32) -> Decimal {
    Decimal::from(categories) * Decimal::new(5, precision + 1)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn extreme(record: &ExpenseRecord) -> ExtremeExpense {
    ExtremeExpense {
        amount: record.amount(),
        record: record.clone(),
    }
}

/// `part` as a percentage of `whole`, or zero when `whole` is zero.
///
/// Divides first so that a share of an already representable total stays
/// representable.
fn share_of(part: Decimal, whole: Decimal, precision: u32) -> Result<Decimal> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(precision))
        .ok_or(ExpenseError::AmountOverflow("percentage_of_total"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
