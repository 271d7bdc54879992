//! CLI output formatting for build results.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.
//!
//! ```text
//! Winery age: 104 года
//!
//! Categories
//! 001 Белые вина (3 products)
//! 002 Красные вина (2 products)
//! 003 Напитки (1 product)
//!
//! Wrote index.html (6 products, 4812 bytes)
//! ```

use crate::pipeline::BuildReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn products(n: usize) -> String {
    if n == 1 {
        "1 product".to_string()
    } else {
        format!("{n} products")
    }
}

/// Category headings with product counts.
pub fn format_catalog(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!("Winery age: {}", report.winery_age), String::new()];
    lines.push("Categories".to_string());
    if report.catalog.is_empty() {
        lines.push("    (no products)".to_string());
    }
    for (i, group) in report.catalog.groups().iter().enumerate() {
        let title = if group.category.is_empty() {
            "(no category)"
        } else {
            group.category.as_str()
        };
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            title,
            products(group.records.len())
        ));
    }
    lines
}

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = format_catalog(report);
    lines.push(String::new());
    lines.push(format!(
        "Wrote {} ({}, {} bytes)",
        report.output.display(),
        products(report.catalog.len()),
        report.bytes_written
    ));
    lines
}

pub fn format_check_output(report: &BuildReport) -> Vec<String> {
    let mut lines = format_catalog(report);
    lines.push(String::new());
    lines.push(format!("Data is valid: {}", products(report.catalog.len())));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

pub fn print_check_output(report: &BuildReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}
