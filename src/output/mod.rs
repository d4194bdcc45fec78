//! Output formatting for run results.
//!
//! - [`report`] - end-of-run summary and failure table
//! - [`terminal`] - failure table layout

mod report;
mod terminal;

pub use report::{failure_rows, print_summary, summary_lines, FailureRow};
