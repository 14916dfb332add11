//! Validation-and-aggregation pipeline for expense records.
//!
//! Reads delimited expense files into typed records, applies data-quality
//! checks, and computes the statistical summary handed to renderers.

pub mod aggregator;
pub mod pipeline;
pub mod reader;
pub mod validator;

pub use expense_core as core;
