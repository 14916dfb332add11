//! Presentation layer for expense analysis results.
//!
//! Every renderer reads a [`ReportView`] borrowed from the pipeline output and
//! never mutates it: a plain-text console report, terminal bar charts and a
//! JSON summary file.

pub mod charts;
pub mod console;
pub mod renderer;
pub mod writer;

pub use charts::BarChart;
pub use console::ConsoleReport;
pub use renderer::{Renderer, ReportView};
pub use writer::SummaryWriter;
