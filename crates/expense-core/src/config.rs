//! JSON configuration for the expense pipeline.
//!
//! Every section and field carries a default, so a partial file is merged
//! over [`AnalysisConfig::default`] field by field. The resulting value is
//! immutable and passed explicitly into each pipeline stage.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ExpenseError, Result};
use crate::models::EXPENSE_COLUMNS;

/// Log level names accepted in the config file and on the command line.
pub const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Upper bound on `currency_precision`.
pub const MAX_CURRENCY_PRECISION: u32 = 10;

/// Largest magnitude accepted for `min_amount` / `max_amount`.
pub const MAX_AMOUNT_MAGNITUDE: i64 = 1_000_000_000_000_000;

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_console: bool,
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            log_to_console: true,
            log_to_file: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub default_input: PathBuf,
    pub default_output: PathBuf,
    pub logs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            default_input: PathBuf::from("data/expenses_example.csv"),
            default_output: PathBuf::from("output"),
            logs: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// strftime pattern of the input `Date` column.
    pub date_format: String,
    /// strftime pattern used when dates are displayed.
    pub output_date_format: String,
    pub currency_symbol: String,
    /// Decimal places for percentage rounding and money display.
    #[serde(alias = "decimal_places")]
    pub currency_precision: u32,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            output_date_format: "%m/%d/%Y".to_string(),
            currency_symbol: "$".to_string(),
            currency_precision: 2,
        }
    }
}

/// What to do with the second and later copies of an identical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    DropAfterFirst,
    KeepWithWarning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub required_columns: Vec<String>,
    /// Inclusive lower bound on `amount`.
    pub min_amount: Decimal,
    /// Inclusive upper bound on `amount`.
    pub max_amount: Decimal,
    #[serde(alias = "allow_missing_description")]
    pub allow_empty_description: bool,
    pub duplicate_policy: DuplicatePolicy,
    /// Earliest acceptable record date, if bounded.
    pub min_date: Option<NaiveDate>,
    /// Latest acceptable record date, if bounded.
    pub max_date: Option<NaiveDate>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_columns: EXPENSE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            min_amount: Decimal::ZERO,
            max_amount: Decimal::from(1_000_000),
            allow_empty_description: true,
            duplicate_policy: DuplicatePolicy::default(),
            min_date: None,
            max_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub show_plots: bool,
    /// Width in terminal columns of the longest chart bar.
    pub bar_width: usize,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            show_plots: false,
            bar_width: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub use_timestamp: bool,
    pub timestamp_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_timestamp: true,
            timestamp_format: "%Y%m%d_%H%M%S".to_string(),
        }
    }
}

// ── AnalysisConfig ────────────────────────────────────────────────────────────

/// Complete, validated configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
    pub analysis: AnalysisSection,
    #[serde(alias = "validation")]
    pub data_validation: ValidationConfig,
    pub visualization: VisualizationConfig,
    pub output: OutputConfig,
}

impl AnalysisConfig {
    /// Load configuration from `path`.
    ///
    /// * `None` → defaults.
    /// * A path that does not exist → a warning and defaults.
    /// * An unreadable file or invalid JSON → [`ExpenseError::Config`].
    ///
    /// The loaded value is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No configuration file specified, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Configuration file not found: {}. Using defaults.",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExpenseError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&content).map_err(|e| match e {
            ExpenseError::Config(msg) => {
                ExpenseError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        info!("Configuration loaded from: {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ExpenseError::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_uppercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ExpenseError::Config(format!(
                "invalid logging level: {}. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        let rules = &self.data_validation;
        if rules.min_amount > rules.max_amount {
            return Err(ExpenseError::Config(format!(
                "min_amount ({}) exceeds max_amount ({})",
                rules.min_amount, rules.max_amount
            )));
        }
        let limit = Decimal::from(MAX_AMOUNT_MAGNITUDE);
        if rules.min_amount.abs() > limit || rules.max_amount.abs() > limit {
            return Err(ExpenseError::Config(format!(
                "amount bounds must lie within [-{}, {}]",
                limit, limit
            )));
        }
        if rules.required_columns.is_empty() {
            return Err(ExpenseError::Config(
                "required_columns must not be empty".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (rules.min_date, rules.max_date) {
            if min > max {
                return Err(ExpenseError::Config(format!(
                    "min_date ({}) is after max_date ({})",
                    min, max
                )));
            }
        }

        if self.analysis.currency_precision > MAX_CURRENCY_PRECISION {
            return Err(ExpenseError::Config(format!(
                "currency_precision must be at most {}, got {}",
                MAX_CURRENCY_PRECISION, self.analysis.currency_precision
            )));
        }
        check_strftime("date_format", &self.analysis.date_format)?;
        check_strftime("output_date_format", &self.analysis.output_date_format)?;
        check_strftime("timestamp_format", &self.output.timestamp_format)?;
        if self.output.timestamp_format.contains(['/', '\\']) {
            return Err(ExpenseError::Config(format!(
                "timestamp_format must not contain path separators: {}",
                self.output.timestamp_format
            )));
        }

        if self.visualization.bar_width == 0 {
            return Err(ExpenseError::Config(
                "bar_width must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reject empty patterns and patterns chrono cannot tokenize.
fn check_strftime(field: &str, pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(ExpenseError::Config(format!("{} must not be empty", field)));
    }
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(ExpenseError::Config(format!(
            "{} is not a valid date pattern: {}",
            field, pattern
        )));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
