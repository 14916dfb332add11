//! Delimited-file loading for expense records.
//!
//! The reader is the only place untyped cells are coerced into
//! [`ExpenseRecord`] values. It performs no logging of its own: every
//! excluded row is returned as a [`RowParseFailure`] for the caller to report.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;

use expense_core::config::AnalysisConfig;
use expense_core::error::{ExpenseError, Result};
use expense_core::models::{
    ExpenseRecord, ParseFailureKind, RowParseFailure, COLUMN_AMOUNT, COLUMN_CATEGORY,
    COLUMN_DATE, COLUMN_DESCRIPTION,
};

/// Columns the reader cannot build a record without, whatever the
/// configured `required_columns` say.
const CORE_COLUMNS: [&str; 3] = [COLUMN_DATE, COLUMN_CATEGORY, COLUMN_AMOUNT];

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything the reader learned about one input.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    /// Header names in file order.
    pub columns: Vec<String>,
    /// Successfully coerced records, in read order.
    pub records: Vec<ExpenseRecord>,
    /// Rows that could not be coerced.
    pub failures: Vec<RowParseFailure>,
    /// Number of data rows encountered (parsed + failed).
    pub rows_read: usize,
}

/// One untyped input line: a view mapping header names to raw cell text.
///
/// Only lives while the reader is working through the file.
pub struct RawRow<'a> {
    row: usize,
    columns: &'a [String],
    record: &'a StringRecord,
}

impl<'a> RawRow<'a> {
    pub fn new(row: usize, columns: &'a [String], record: &'a StringRecord) -> Self {
        Self {
            row,
            columns,
            record,
        }
    }

    /// 1-based data-row number.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Raw cell under `column`, or `None` when the column is absent.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.record.get(index)
    }

    /// `(column, cell)` pairs in header order.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.record.iter())
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Open `path` and parse it with [`parse_expenses`].
pub fn read_expenses(path: &Path, config: &AnalysisConfig) -> Result<ReadOutcome> {
    if !path.exists() {
        return Err(ExpenseError::InputNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ExpenseError::NotAFile(path.to_path_buf()));
    }

    let file = std::fs::File::open(path).map_err(|source| ExpenseError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_expenses(file, config)
}

/// Parse delimited expense data from any byte source.
///
/// The header is checked before any row is touched: a missing required
/// column is a [`ExpenseError::Schema`] for the whole input. Each data row
/// is then coerced independently; a bad row becomes a [`RowParseFailure`]
/// and never aborts the batch.
pub fn parse_expenses<R: Read>(input: R, config: &AnalysisConfig) -> Result<ReadOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    check_columns(&columns, &config.data_validation.required_columns)?;

    let date_format = config.analysis.date_format.as_str();
    let mut outcome = ReadOutcome {
        columns,
        ..ReadOutcome::default()
    };

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        outcome.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                outcome.failures.push(RowParseFailure::new(
                    row,
                    ParseFailureKind::MalformedRow,
                    err.to_string(),
                ));
                continue;
            }
        };

        if record.len() != outcome.columns.len() {
            outcome.failures.push(RowParseFailure::new(
                row,
                ParseFailureKind::MalformedRow,
                format!(
                    "expected {} fields, found {}",
                    outcome.columns.len(),
                    record.len()
                ),
            ));
            continue;
        }

        let raw = RawRow::new(row, &outcome.columns, &record);
        match parse_row(&raw, date_format) {
            Ok(expense) => outcome.records.push(expense),
            Err(failure) => outcome.failures.push(failure),
        }
    }

    Ok(outcome)
}

/// Coerce one raw row into a typed record.
///
/// Both the date and the amount are checked so a failure names every
/// problem in the row; the kind reflects the first one found.
pub fn parse_row(
    raw: &RawRow<'_>,
    date_format: &str,
) -> std::result::Result<ExpenseRecord, RowParseFailure> {
    let date_cell = raw.get(COLUMN_DATE).unwrap_or_default();
    let amount_cell = raw.get(COLUMN_AMOUNT).unwrap_or_default();

    let date = parse_date(date_cell, date_format);
    let amount = parse_amount(amount_cell);

    let mut problems: Vec<(ParseFailureKind, String)> = Vec::new();
    if date.is_none() {
        problems.push((
            ParseFailureKind::InvalidDate,
            format!("invalid date '{}' (expected {})", date_cell, date_format),
        ));
    }
    if amount.is_none() {
        problems.push((
            ParseFailureKind::InvalidAmount,
            format!("invalid amount '{}'", amount_cell),
        ));
    }

    match (date, amount) {
        (Some(date), Some(amount)) => Ok(ExpenseRecord::new(
            raw.row(),
            date,
            raw.get(COLUMN_CATEGORY).unwrap_or_default(),
            amount,
            raw.get(COLUMN_DESCRIPTION).unwrap_or_default(),
        )),
        _ => {
            let kind = problems
                .first()
                .map(|(k, _)| *k)
                .unwrap_or(ParseFailureKind::MalformedRow);
            let reason = problems
                .into_iter()
                .map(|(_, msg)| msg)
                .collect::<Vec<_>>()
                .join("; ");
            Err(RowParseFailure::new(raw.row(), kind, reason))
        }
    }
}

/// Parse a date cell with a strftime pattern. Only real calendar dates are
/// accepted.
pub fn parse_date(cell: &str, pattern: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), pattern).ok()
}

/// Parse an amount cell as an exact decimal.
///
/// Accepts an optional sign and scientific notation; rejects empty cells,
/// currency symbols, thousands separators and non-finite spellings.
pub fn parse_amount(cell: &str) -> Option<Decimal> {
    let trimmed = cell.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let double_sign = unsigned.len() != trimmed.len() && unsigned.starts_with(['+', '-']);
    if unsigned.is_empty() || double_sign {
        return None;
    }

    Decimal::from_str(unsigned)
        .or_else(|_| Decimal::from_scientific(unsigned))
        .ok()
}

/// Fail with a schema error unless every required and core column is
/// present. Each missing name is reported once.
pub fn check_columns(columns: &[String], required: &[String]) -> Result<()> {
    let mut missing: Vec<String> = Vec::new();
    let wanted = required
        .iter()
        .map(String::as_str)
        .chain(CORE_COLUMNS.iter().copied());

    for name in wanted {
        if !columns.iter().any(|c| c == name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExpenseError::Schema {
            missing,
            found: columns.to_vec(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
