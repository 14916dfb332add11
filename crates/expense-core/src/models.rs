use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header name of the date column.
pub const COLUMN_DATE: &str = "Date";
/// Header name of the category column.
pub const COLUMN_CATEGORY: &str = "Category";
/// Header name of the amount column.
pub const COLUMN_AMOUNT: &str = "Amount";
/// Header name of the free-text description column.
pub const COLUMN_DESCRIPTION: &str = "Description";

/// The full column set of an expense file.
pub const EXPENSE_COLUMNS: [&str; 4] = [
    COLUMN_DATE,
    COLUMN_CATEGORY,
    COLUMN_AMOUNT,
    COLUMN_DESCRIPTION,
];

// ── ExpenseRecord ─────────────────────────────────────────────────────────────

/// A single typed expense row.
///
/// Fields are private: once the reader has coerced a row into a record
/// nothing downstream can change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// 1-based data-row number in the input (header excluded).
    row: usize,
    date: NaiveDate,
    category: String,
    amount: Decimal,
    description: String,
}

impl ExpenseRecord {
    pub fn new(
        row: usize,
        date: NaiveDate,
        category: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            row,
            date,
            category: category.into(),
            amount,
            description: description.into(),
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Identity used for duplicate detection: all four data fields, with the
    /// amount normalised so that `5.0` and `5.00` compare equal.
    pub fn content_key(&self) -> (NaiveDate, &str, Decimal, &str) {
        (
            self.date,
            &self.category,
            self.amount.normalize(),
            &self.description,
        )
    }
}

// ── RecordSet ─────────────────────────────────────────────────────────────────

/// An ordered, exclusively owned collection of expense records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordSet {
    records: Vec<ExpenseRecord>,
}

impl RecordSet {
    /// Wrap records after a stable ascending sort by date, so records sharing
    /// a date keep their read order.
    pub fn sorted_by_date(mut records: Vec<ExpenseRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExpenseRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` when dates are non-decreasing.
    pub fn is_sorted_by_date(&self) -> bool {
        self.records.windows(2).all(|w| w[0].date <= w[1].date)
    }

    /// Earliest and latest date, or `None` for an empty set.
    pub fn date_range(&self) -> Option<DateRange> {
        let start = self.records.iter().map(|r| r.date).min()?;
        let end = self.records.iter().map(|r| r.date).max()?;
        Some(DateRange { start, end })
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ExpenseRecord;
    type IntoIter = std::slice::Iter<'a, ExpenseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ── Row-level problems ────────────────────────────────────────────────────────

/// Why the reader could not turn a row into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureKind {
    InvalidDate,
    InvalidAmount,
    /// Wrong number of fields or undecodable bytes.
    MalformedRow,
}

/// A row the reader excluded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowParseFailure {
    pub row: usize,
    pub kind: ParseFailureKind,
    pub reason: String,
}

impl RowParseFailure {
    pub fn new(row: usize, kind: ParseFailureKind, reason: impl Into<String>) -> Self {
        Self {
            row,
            kind,
            reason: reason.into(),
        }
    }
}

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Carried over from a reader parse failure.
    RowParse,
    EmptyCategory,
    EmptyDescription,
    AmountOutOfRange,
    Duplicate,
    DateOutOfBounds,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::RowParse => "parse error",
            IssueKind::EmptyCategory => "empty category",
            IssueKind::EmptyDescription => "empty description",
            IssueKind::AmountOutOfRange => "amount out of range",
            IssueKind::Duplicate => "duplicate",
            IssueKind::DateOutOfBounds => "date out of bounds",
        };
        f.write_str(label)
    }
}

/// What happened to the row an issue refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    /// The row was removed from the validated set.
    Excluded,
    /// The row was kept but carries a warning.
    Flagged,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub row: usize,
    pub message: String,
    pub action: IssueAction,
}

/// Accept / warn / reject outcome of validating a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Accepted,
    AcceptedWithWarnings,
    Rejected,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Disposition::Accepted => "accepted",
            Disposition::AcceptedWithWarnings => "accepted_with_warnings",
            Disposition::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Per-row issues plus the final disposition of one validator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
    disposition: Disposition,
    /// Rows seen, including those the reader could not parse.
    rows_checked: usize,
    records_accepted: usize,
}

impl ValidationReport {
    pub fn new(
        issues: Vec<ValidationIssue>,
        disposition: Disposition,
        rows_checked: usize,
        records_accepted: usize,
    ) -> Self {
        Self {
            issues,
            disposition,
            rows_checked,
            records_accepted,
        }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn rows_checked(&self) -> usize {
        self.rows_checked
    }

    pub fn records_accepted(&self) -> usize {
        self.records_accepted
    }

    pub fn is_rejected(&self) -> bool {
        self.disposition == Disposition::Rejected
    }

    /// Issues of a single kind, in report order.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Number of distinct rows removed from the validated set.
    pub fn excluded_rows(&self) -> usize {
        let mut rows: Vec<usize> = self
            .issues
            .iter()
            .filter(|i| i.action == IssueAction::Excluded)
            .map(|i| i.row)
            .collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    /// Number of issues that kept their row.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.action == IssueAction::Flagged)
            .count()
    }
}

// ── AnalysisSummary ───────────────────────────────────────────────────────────

/// Inclusive date span of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar months touched by the range, counting both
    /// endpoint months.
    pub fn months_spanned(&self) -> u32 {
        let start = self.start.year() * 12 + self.start.month0() as i32;
        let end = self.end.year() * 12 + self.end.month0() as i32;
        (end - start + 1).max(1) as u32
    }
}

/// The largest or smallest expense together with the record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremeExpense {
    pub amount: Decimal,
    pub record: ExpenseRecord,
}

/// Spend attributed to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
    /// Share of `total_spent`, rounded to the configured precision.
    pub percentage_of_total: Decimal,
}

/// Spend within one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
    pub count: usize,
}

impl MonthlyTotal {
    /// `"YYYY-MM"` label.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Aggregate statistics over a validated record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_spent: Decimal,
    pub record_count: usize,
    pub date_range: DateRange,
    /// `total_spent` divided by the number of calendar months spanned.
    pub monthly_average: Decimal,
    /// `total_spent` divided by `record_count`.
    pub average_expense: Decimal,
    pub max_expense: ExtremeExpense,
    pub min_expense: ExtremeExpense,
    /// Ordered by descending total, ties alphabetical.
    pub by_category: Vec<CategoryBreakdown>,
    /// Every month in `date_range`, ascending, including months without spend.
    pub monthly_totals: Vec<MonthlyTotal>,
}

impl AnalysisSummary {
    /// Look up a category's breakdown by exact name.
    pub fn category(&self, name: &str) -> Option<&CategoryBreakdown> {
        self.by_category.iter().find(|c| c.category == name)
    }

    /// Unique category names, alphabetical.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_category.iter().map(|c| c.category.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Sum of all rounded category percentages.
    pub fn percentage_sum(&self) -> Decimal {
        self.by_category.iter().map(|c| c.percentage_of_total).sum()
    }
}
