//! Test-run and probe output.

use crate::verify::SuiteReport;
use owo_colors::OwoColorize;

pub fn format_suite_report(report: &SuiteReport) -> String {
    let mut output = String::new();
    if !report.stdout.trim().is_empty() {
        output.push_str(report.stdout.trim_end());
        output.push('\n');
    }
    if !report.passed && !report.stderr.trim().is_empty() {
        output.push_str(report.stderr.trim_end());
        output.push('\n');
    }
    let status = match report.exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    if report.passed {
        output.push_str(&format!(
            "{} {} ({})",
            "PASSED".green().bold(),
            report.suite.display(),
            status
        ));
    } else {
        output.push_str(&format!(
            "{} {} ({})",
            "FAILED".red().bold(),
            report.suite.display(),
            status
        ));
    }
    output
}

pub fn format_probe_result(host: &str, reachable: bool) -> String {
    if reachable {
        format!("{} {}", "reachable:".green(), host)
    } else {
        format!(
            "{} {} did not answer; generated tests will fail until it is running",
            "warning:".yellow().bold(),
            host
        )
    }
}
