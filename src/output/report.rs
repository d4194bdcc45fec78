//! End-of-run report.

use super::terminal::{header_line, table_line};
use crate::models::{network_name, NetworkUnit, Summary};
use chrono::{DateTime, Local};
use colored::Colorize;

/// One failed unit, flattened for printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRow {
    pub index: u32,
    /// `auth`, `skipped`, `network` or `orphaned`.
    pub kind: &'static str,
    pub network_name: String,
    pub cidr: String,
    /// Set only for orphaned networks.
    pub network_id: String,
    pub error: String,
}

impl FailureRow {
    /// Values in table column order.
    pub fn fields(&self) -> [String; 6] {
        [
            self.index.to_string(),
            self.kind.to_string(),
            self.network_name.clone(),
            self.cidr.clone(),
            self.network_id.clone(),
            self.error.clone(),
        ]
    }
}

/// Failure rows in index order.
pub fn failure_rows(summary: &Summary) -> Vec<FailureRow> {
    let mut rows: Vec<FailureRow> = summary
        .failures
        .iter()
        .map(|(index, e)| FailureRow {
            index: *index,
            kind: e.kind(),
            network_name: network_name(*index),
            cidr: NetworkUnit::new(*index)
                .map(|u| u.cidr.to_string())
                .unwrap_or_else(|_| "none".to_string()),
            network_id: e.orphaned_network_id().unwrap_or("None").to_string(),
            error: e.to_string(),
        })
        .collect();
    rows.sort_by_key(|r| r.index);
    rows
}

/// Plain-text totals, one line per category.
pub fn summary_lines(summary: &Summary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Units: {total} created: {created} failed: {failed}",
            total = summary.total,
            created = summary.created.len(),
            failed = summary.failures.len()
        ),
        format!(
            "  skipped (address range exceeded): {}",
            summary.count_kind("skipped")
        ),
        format!("  connect/auth failures: {}", summary.count_kind("auth")),
        format!("  network create failures: {}", summary.count_kind("network")),
        format!(
            "  subnet create failures (orphaned networks): {}",
            summary.count_kind("orphaned")
        ),
    ];
    for (index, id) in summary.orphaned_networks() {
        lines.push(format!(
            "  orphaned network {id} ({name})",
            name = network_name(index)
        ));
    }
    lines
}

/// Print the failure table and totals to stdout.
pub fn print_summary(summary: &Summary, started: DateTime<Local>, finished: DateTime<Local>) {
    log::info!(
        "#Start print_summary() created={} failed={}",
        summary.created.len(),
        summary.failures.len()
    );

    let rows = failure_rows(summary);
    if !rows.is_empty() {
        println!();
        println!("{}", header_line());
        for row in &rows {
            println!("{}", table_line(row.fields()));
        }
    }

    println!();
    println!(
        "Started {started}, finished {finished} ({secs}s)",
        started = started.format("%Y-%m-%d %H:%M:%S"),
        finished = finished.format("%Y-%m-%d %H:%M:%S"),
        secs = (finished - started).num_seconds()
    );
    for line in summary_lines(summary) {
        println!("{line}");
    }

    if summary.is_success() {
        println!(
            "{}",
            format!("All {} networks created.", summary.total).green()
        );
    } else {
        println!(
            "{}",
            format!(
                "{} of {} networks not created.",
                summary.total - summary.created.len(),
                summary.total
            )
            .on_red()
        );
    }
}
