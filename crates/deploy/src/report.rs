//! Terminal reporting for validation, test and deploy results.

use crate::diff::{DatasourceSummary, DiffReport};
use crate::testing::TestReport;
use crate::unit::UnitReport;
use aifabrix_common::OutcomeSummary;
use colored::Colorize;

/// Print per-file validation results and a summary line.
pub fn print_unit_report(report: &UnitReport) {
    for (file, result) in &report.items {
        let status = if result.valid {
            "ok".green()
        } else {
            "invalid".red()
        };
        println!("  {:<40} {}", file, status);
        for error in &result.errors {
            println!("    {} {}", "error:".red().bold(), error);
        }
        for warning in &result.warnings {
            println!("    {} {}", "warning:".yellow().bold(), warning);
        }
    }

    println!();
    if report.valid() {
        println!("{} all files valid", "OK".green().bold());
    } else {
        println!(
            "{} {} error(s) across {} file(s)",
            "FAILED".red().bold(),
            report.result.errors.len(),
            report.items.len()
        );
    }
}

/// Print the per-datasource outcomes of an integration-test run.
pub fn print_test_report(report: &TestReport) {
    println!("Test run {}", report.run_id);
    print_outcomes(&report.summary);
}

/// Print the per-datasource outcomes of a deploy run.
pub fn print_deploy_report(summary: &OutcomeSummary) {
    print_outcomes(summary);
}

fn print_outcomes(summary: &OutcomeSummary) {
    for item in &summary.items {
        if item.skipped {
            println!(
                "  {:<30} {} ({})",
                item.key,
                "skipped".yellow(),
                item.reason.as_deref().unwrap_or("")
            );
        } else if item.success {
            println!("  {:<30} {}", item.key, "passed".green());
        } else {
            println!(
                "  {:<30} {} {}",
                item.key,
                "failed".red().bold(),
                item.error.as_deref().unwrap_or("")
            );
        }
    }

    println!();
    println!(
        "{}: {} passed, {} failed, {} skipped",
        if summary.success {
            "OK".green().bold()
        } else {
            "FAILED".red().bold()
        },
        summary.passed(),
        summary.failed(),
        summary.skipped()
    );
}

/// Print a `datasource list` table.
pub fn print_datasource_list(summaries: &[DatasourceSummary]) {
    println!(
        "{:<20} {:<24} {:<16} {}",
        "KEY", "DISPLAY NAME", "ENTITY", "TEST PAYLOAD"
    );
    for summary in summaries {
        println!(
            "{:<20} {:<24} {:<16} {}",
            summary.key,
            summary.display_name.as_deref().unwrap_or("-"),
            summary.entity.as_deref().unwrap_or("-"),
            if summary.has_test_payload { "yes" } else { "no" }
        );
    }
}

/// Print a local-vs-remote diff.
pub fn print_diff(report: &DiffReport) {
    if report.is_empty() {
        println!("{} local files match the remote configuration", "OK".green().bold());
        return;
    }
    for key in &report.added {
        println!("  {} {}", "+".green().bold(), key);
    }
    for key in &report.removed {
        println!("  {} {}", "-".red().bold(), key);
    }
    for key in &report.changed {
        println!("  {} {}", "~".yellow().bold(), key);
    }
}
