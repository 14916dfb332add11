use std::path::PathBuf;
use thiserror::Error;

/// All set-level errors produced by the expense pipeline.
///
/// Row-level problems (a malformed date, an out-of-range amount) are never
/// surfaced through this type; they travel as values inside the
/// [`crate::models::ValidationReport`].
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// One or more required columns are absent from the header row.
    #[error(
        "Missing required columns: {} (found: {})",
        .missing.join(", "),
        .found.join(", ")
    )]
    Schema {
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// Validation left no usable records, so the batch was rejected.
    #[error("Validation rejected the data set: {message}")]
    Validation { message: String, issues: usize },

    /// Aggregation was attempted over zero records.
    #[error("Cannot aggregate an empty data set")]
    EmptyDataset,

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path does not exist.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The input path exists but is not a regular file.
    #[error("Input path is not a file: {0}")]
    NotAFile(PathBuf),

    /// An exact sum or ratio left the representable decimal range.
    #[error("Amount arithmetic overflowed while computing {0}")]
    AmountOverflow(&'static str),

    /// The delimited input could not be decoded at the stream level.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExpenseError {
    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            ExpenseError::Schema { .. }
            | ExpenseError::Csv(_)
            | ExpenseError::InputNotFound(_)
            | ExpenseError::NotAFile(_)
            | ExpenseError::FileRead { .. } => "reader",
            ExpenseError::Validation { .. } => "validator",
            ExpenseError::EmptyDataset | ExpenseError::AmountOverflow(_) => "aggregator",
            ExpenseError::Config(_) => "config",
            ExpenseError::JsonParse(_) | ExpenseError::Io(_) => "io",
        }
    }
}

/// Convenience alias used throughout the expense crates.
pub type Result<T> = std::result::Result<T, ExpenseError>;
