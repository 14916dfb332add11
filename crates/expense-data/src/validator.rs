//! Data-quality checks over a freshly read record set.
//!
//! Checks run in a fixed order and each records its own findings:
//!
//! 1. schema completeness (fatal),
//! 2. null / empty text,
//! 3. amount range,
//! 4. duplicates,
//! 5. date sanity.
//!
//! Reader parse failures are folded in first so the disposition accounts for
//! every row that will not reach aggregation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, warn};

use expense_core::config::{AnalysisConfig, DuplicatePolicy, ValidationConfig};
use expense_core::error::{ExpenseError, Result};
use expense_core::models::{
    Disposition, ExpenseRecord, IssueAction, IssueKind, RecordSet, ValidationIssue,
    ValidationReport,
};

use crate::reader::{check_columns, ReadOutcome};

// ── Validated ─────────────────────────────────────────────────────────────────

/// Output of one validator call.
#[derive(Debug, Clone)]
pub struct Validated {
    pub report: ValidationReport,
    /// Surviving records, sorted ascending by date.
    pub records: RecordSet,
}

impl Validated {
    /// Refuse a rejected batch with [`ExpenseError::Validation`].
    pub fn into_accepted(self) -> Result<Self> {
        if self.report.is_rejected() {
            return Err(ExpenseError::Validation {
                message: format!(
                    "no records passed validation ({} rows checked, {} issues)",
                    self.report.rows_checked(),
                    self.report.issues().len()
                ),
                issues: self.report.issues().len(),
            });
        }
        Ok(self)
    }
}

// ── RecordValidator ───────────────────────────────────────────────────────────

/// Applies the configured data-quality rules to a [`ReadOutcome`].
pub struct RecordValidator<'a> {
    rules: &'a ValidationConfig,
}

impl<'a> RecordValidator<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            rules: &config.data_validation,
        }
    }

    /// Validate `outcome` without mutating it.
    ///
    /// Returns a schema error when a required column is absent; every other
    /// problem is a row-level [`ValidationIssue`].
    pub fn validate(&self, outcome: &ReadOutcome) -> Result<Validated> {
        self.check_schema(&outcome.columns)?;

        let mut issues: Vec<ValidationIssue> = outcome
            .failures
            .iter()
            .map(|f| ValidationIssue {
                kind: IssueKind::RowParse,
                row: f.row,
                message: f.reason.clone(),
                action: IssueAction::Excluded,
            })
            .collect();

        let records = &outcome.records;
        let mut excluded = vec![false; records.len()];

        self.check_required_text(records, &mut excluded, &mut issues);
        self.check_range(records, &mut excluded, &mut issues);
        self.check_duplicates(records, &mut excluded, &mut issues);
        self.check_date_sanity(records, &mut excluded, &mut issues);

        let survivors: Vec<ExpenseRecord> = records
            .iter()
            .zip(&excluded)
            .filter(|(_, gone)| !**gone)
            .map(|(r, _)| r.clone())
            .collect();

        let disposition = classify(survivors.len(), &issues);
        let report = ValidationReport::new(issues, disposition, outcome.rows_read, survivors.len());

        for issue in report.issues() {
            debug!("Row {}: {} ({})", issue.row, issue.kind, issue.message);
        }
        if report.issues().is_empty() {
            debug!("All {} records passed validation", survivors.len());
        } else {
            warn!(
                "Validation finished with {} issues: {} rows excluded, {} records kept ({})",
                report.issues().len(),
                report.excluded_rows(),
                survivors.len(),
                disposition
            );
        }

        Ok(Validated {
            report,
            records: RecordSet::sorted_by_date(survivors),
        })
    }

    // ── Checks ────────────────────────────────────────────────────────────────

    /// Re-assert that the header carried every required column.
    fn check_schema(&self, columns: &[String]) -> Result<()> {
        check_columns(columns, &self.rules.required_columns)
    }

    /// `category` must be non-blank; `description` only if configured so.
    fn check_required_text(
        &self,
        records: &[ExpenseRecord],
        excluded: &mut [bool],
        issues: &mut Vec<ValidationIssue>,
    ) {
        for (record, gone) in records.iter().zip(excluded.iter_mut()) {
            if record.category().trim().is_empty() {
                *gone = true;
                issues.push(excluded_issue(
                    IssueKind::EmptyCategory,
                    record,
                    "category is empty".to_string(),
                ));
            }
            if !self.rules.allow_empty_description && record.description().trim().is_empty() {
                *gone = true;
                issues.push(excluded_issue(
                    IssueKind::EmptyDescription,
                    record,
                    "description is empty".to_string(),
                ));
            }
        }
    }

    /// `min_amount <= amount <= max_amount`, both bounds inclusive.
    fn check_range(
        &self,
        records: &[ExpenseRecord],
        excluded: &mut [bool],
        issues: &mut Vec<ValidationIssue>,
    ) {
        let (min, max) = (self.rules.min_amount, self.rules.max_amount);
        for (record, gone) in records.iter().zip(excluded.iter_mut()) {
            let amount = record.amount();
            if amount < min || amount > max {
                *gone = true;
                issues.push(excluded_issue(
                    IssueKind::AmountOutOfRange,
                    record,
                    format!("amount {} outside allowed range [{}, {}]", amount, min, max),
                ));
            }
        }
    }

    /// Flag rows identical to an earlier row across all four fields.
    fn check_duplicates(
        &self,
        records: &[ExpenseRecord],
        excluded: &mut [bool],
        issues: &mut Vec<ValidationIssue>,
    ) {
        let mut first_rows = HashMap::new();
        for (record, gone) in records.iter().zip(excluded.iter_mut()) {
            let first = match first_rows.entry(record.content_key()) {
                Entry::Vacant(slot) => {
                    slot.insert(record.row());
                    continue;
                }
                Entry::Occupied(slot) => *slot.get(),
            };

            let action = match self.rules.duplicate_policy {
                DuplicatePolicy::DropAfterFirst => {
                    *gone = true;
                    IssueAction::Excluded
                }
                DuplicatePolicy::KeepWithWarning => IssueAction::Flagged,
            };
            issues.push(ValidationIssue {
                kind: IssueKind::Duplicate,
                row: record.row(),
                message: format!("duplicate of row {}", first),
                action,
            });
        }
    }

    /// Dates outside the configured bounds are rejected.
    fn check_date_sanity(
        &self,
        records: &[ExpenseRecord],
        excluded: &mut [bool],
        issues: &mut Vec<ValidationIssue>,
    ) {
        for (record, gone) in records.iter().zip(excluded.iter_mut()) {
            let date = record.date();
            let too_early = self.rules.min_date.is_some_and(|min| date < min);
            let too_late = self.rules.max_date.is_some_and(|max| date > max);
            if too_early || too_late {
                *gone = true;
                issues.push(excluded_issue(
                    IssueKind::DateOutOfBounds,
                    record,
                    format!("date {} outside allowed bounds", date),
                ));
            }
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn excluded_issue(kind: IssueKind, record: &ExpenseRecord, message: String) -> ValidationIssue {
    ValidationIssue {
        kind,
        row: record.row(),
        message,
        action: IssueAction::Excluded,
    }
}

/// Rejected when nothing survived; warned when anything was excluded or
/// flagged; accepted otherwise.
fn classify(survivors: usize, issues: &[ValidationIssue]) -> Disposition {
    if survivors == 0 {
        Disposition::Rejected
    } else if !issues.is_empty() {
        Disposition::AcceptedWithWarnings
    } else {
        Disposition::Accepted
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_expenses;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const HEADER: &str = "Date,Category,Amount,Description\n";

    fn read(body: &str, config: &AnalysisConfig) -> ReadOutcome {
        parse_expenses(format!("{HEADER}{body}").as_bytes(), config).unwrap()
    }

    fn run(body: &str, config: &AnalysisConfig) -> Validated {
        RecordValidator::new(config).validate(&read(body, config)).unwrap()
    }

    // ── disposition ───────────────────────────────────────────────────────────

    #[test]
    fn test_clean_input_is_accepted() {
        let config = AnalysisConfig::default();
        let validated = run(
            "2024-01-01,Food,50.00,Lunch\n2024-01-02,Transport,30.00,Gas\n",
            &config,
        );
        assert_eq!(validated.report.disposition(), Disposition::Accepted);
        assert!(validated.report.issues().is_empty());
        assert_eq!(validated.records.len(), 2);
    }

    #[test]
    fn test_negative_amount_is_excluded_with_warning() {
        let config = AnalysisConfig::default();
        let validated = run(
            "2024-01-01,Food,50.00,Lunch\n2024-01-02,Refund,-5.00,Return\n",
            &config,
        );

        assert_eq!(
            validated.report.disposition(),
            Disposition::AcceptedWithWarnings
        );
        let issue = validated
            .report
            .issues_of(IssueKind::AmountOutOfRange)
            .next()
            .expect("range issue");
        assert_eq!(issue.row, 2);
        assert!(issue.message.contains("-5.00"));
        assert_eq!(validated.records.len(), 1);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut config = AnalysisConfig::default();
        config.data_validation.min_amount = dec!(1);
        config.data_validation.max_amount = dec!(100);
        let validated = run(
            "2024-01-01,A,1,x\n2024-01-02,B,100,y\n2024-01-03,C,100.01,z\n2024-01-04,D,0.99,w\n",
            &config,
        );
        let kept: Vec<&str> = validated.records.iter().map(|r| r.category()).collect();
        assert_eq!(kept, vec!["A", "B"]);
    }

    #[test]
    fn test_zero_amount_accepted_by_default() {
        let validated = run("2024-01-01,Food,0.00,Free sample\n", &AnalysisConfig::default());
        assert_eq!(validated.report.disposition(), Disposition::Accepted);
    }

    #[test]
    fn test_everything_filtered_is_rejected() {
        let config = AnalysisConfig::default();
        let validated = run("2024-01-01,Food,-1,x\n", &config);
        assert_eq!(validated.report.disposition(), Disposition::Rejected);
        assert!(validated.records.is_empty());

        let err = validated.into_accepted().unwrap_err();
        assert!(matches!(err, ExpenseError::Validation { issues: 1, .. }));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let validated = run("", &AnalysisConfig::default());
        assert!(validated.report.is_rejected());
    }

    #[test]
    fn test_parse_failures_become_issues() {
        let validated = run(
            "not-a-date,Food,5,x\n2024-01-01,Food,5,y\n",
            &AnalysisConfig::default(),
        );
        assert_eq!(validated.report.issues_of(IssueKind::RowParse).count(), 1);
        assert_eq!(
            validated.report.disposition(),
            Disposition::AcceptedWithWarnings
        );
        assert_eq!(validated.report.rows_checked(), 2);
    }

    // ── null / empty ──────────────────────────────────────────────────────────

    #[test]
    fn test_blank_category_excluded() {
        let validated = run(
            "2024-01-01,  ,5,x\n2024-01-02,Food,5,y\n",
            &AnalysisConfig::default(),
        );
        assert_eq!(validated.report.issues_of(IssueKind::EmptyCategory).count(), 1);
        assert_eq!(validated.records.len(), 1);
    }

    #[test]
    fn test_empty_description_allowed_by_default() {
        let validated = run("2024-01-01,Food,5,\n", &AnalysisConfig::default());
        assert_eq!(validated.report.disposition(), Disposition::Accepted);
    }

    #[test]
    fn test_empty_description_rejected_when_disallowed() {
        let mut config = AnalysisConfig::default();
        config.data_validation.allow_empty_description = false;
        let validated = run("2024-01-01,Food,5,\n2024-01-02,Food,6,Tea\n", &config);
        assert_eq!(
            validated.report.issues_of(IssueKind::EmptyDescription).count(),
            1
        );
        assert_eq!(validated.records.len(), 1);
    }

    #[test]
    fn test_checks_are_not_short_circuited() {
        let validated = run(
            "2024-01-01,,-3,x\n2024-01-02,Food,5,y\n",
            &AnalysisConfig::default(),
        );
        let kinds: Vec<IssueKind> = validated.report.issues().iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::EmptyCategory, IssueKind::AmountOutOfRange]
        );
        assert_eq!(validated.report.excluded_rows(), 1);
    }

    // ── duplicates ────────────────────────────────────────────────────────────

    #[test]
    fn test_duplicates_dropped_after_first() {
        let validated = run(
            "2024-01-01,Food,5.00,Lunch\n2024-01-01,Food,5.0,Lunch\n2024-01-02,Food,5.00,Lunch\n",
            &AnalysisConfig::default(),
        );
        assert_eq!(validated.records.len(), 2);
        assert_eq!(validated.records.records()[0].row(), 1);

        let dup = validated
            .report
            .issues_of(IssueKind::Duplicate)
            .next()
            .expect("duplicate issue");
        assert_eq!(dup.row, 2);
        assert_eq!(dup.action, IssueAction::Excluded);
        assert_eq!(dup.message, "duplicate of row 1");
    }

    #[test]
    fn test_duplicates_kept_with_warning() {
        let mut config = AnalysisConfig::default();
        config.data_validation.duplicate_policy = DuplicatePolicy::KeepWithWarning;
        let validated = run("2024-01-01,Food,5,Lunch\n2024-01-01,Food,5,Lunch\n", &config);

        assert_eq!(validated.records.len(), 2);
        assert_eq!(validated.report.warning_count(), 1);
        assert_eq!(
            validated.report.disposition(),
            Disposition::AcceptedWithWarnings
        );
    }

    // ── date sanity ───────────────────────────────────────────────────────────

    #[test]
    fn test_dates_outside_bounds_excluded() {
        let mut config = AnalysisConfig::default();
        config.data_validation.min_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        config.data_validation.max_date = NaiveDate::from_ymd_opt(2024, 12, 31);
        let validated = run(
            "2023-12-31,Food,1,a\n2024-06-01,Food,2,b\n2025-01-01,Food,3,c\n",
            &config,
        );
        assert_eq!(
            validated.report.issues_of(IssueKind::DateOutOfBounds).count(),
            2
        );
        assert_eq!(validated.records.len(), 1);
    }

    // ── schema / ordering ─────────────────────────────────────────────────────

    #[test]
    fn test_schema_recheck() {
        let config = AnalysisConfig::default();
        let outcome = ReadOutcome {
            columns: vec!["Date".into(), "Amount".into(), "Description".into()],
            ..ReadOutcome::default()
        };
        let err = RecordValidator::new(&config).validate(&outcome).unwrap_err();
        assert!(matches!(err, ExpenseError::Schema { .. }));
    }

    #[test]
    fn test_validated_records_sorted_by_date() {
        let validated = run(
            "2024-03-01,A,1,x\n2024-01-01,B,2,y\n2024-02-01,C,3,z\n2024-01-01,D,4,w\n",
            &AnalysisConfig::default(),
        );
        assert!(validated.records.is_sorted_by_date());
        let rows: Vec<usize> = validated.records.iter().map(|r| r.row()).collect();
        assert_eq!(rows, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_validation_does_not_mutate_input() {
        let config = AnalysisConfig::default();
        let outcome = read("2024-02-01,A,1,x\n2024-01-01,B,-2,y\n", &config);
        let before = outcome.records.clone();
        RecordValidator::new(&config).validate(&outcome).unwrap();
        assert_eq!(outcome.records, before);
    }
}
