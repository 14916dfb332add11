//! Shared domain types for the expense analyzer.
//!
//! Holds the typed record model, the error taxonomy, the immutable
//! configuration object and the command-line settings consumed by the
//! pipeline and report crates.

pub mod config;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{ExpenseError, Result};
