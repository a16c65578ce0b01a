//! Requirement listings and run summaries.

use crate::generation::RunSummary;
use crate::types::Requirement;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

const DESCRIPTION_PREVIEW: usize = 60;

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > DESCRIPTION_PREVIEW {
        let cut: String = line.chars().take(DESCRIPTION_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

pub fn format_requirements_text(requirements: &[Requirement], fallback: bool) -> String {
    if requirements.is_empty() {
        return "No requirements found.\n\nHeadings must look like '### AC-1: Title'.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Title", "Description"]);
    for requirement in requirements {
        table.add_row(vec![
            requirement.id.clone(),
            requirement.title.clone(),
            preview(&requirement.description),
        ]);
    }
    let source = if fallback {
        "heading parser"
    } else {
        "generation service"
    };
    format!(
        "{}\n\nTotal: {} requirement(s) from the {}",
        table,
        requirements.len(),
        source
    )
}

pub fn format_requirements_json(requirements: &[Requirement], fallback: bool) -> String {
    let out = json!({
        "requirements": requirements,
        "total": requirements.len(),
        "fallback": fallback,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_run_summary_text(summary: &RunSummary, output_path: &Path) -> String {
    let mut output = format!(
        "{} {}\n",
        "Wrote".green().bold(),
        output_path.display()
    );
    output.push_str(&format!(
        "Requirements: {} ({})\n",
        summary.requirement_count,
        if summary.extraction_fallback {
            "heading parser"
        } else {
            "generation service"
        }
    ));
    output.push_str(&format!("Test functions: {}\n", summary.functions.len()));
    for name in &summary.functions {
        output.push_str(&format!("  {}\n", name));
    }
    if !summary.scenario_fallbacks.is_empty() {
        output.push_str(&format!(
            "{} fallback scenarios for {}\n",
            "warning:".yellow().bold(),
            summary.scenario_fallbacks.join(", ")
        ));
    }
    if !summary.synthesis_fallbacks.is_empty() {
        output.push_str(&format!(
            "{} skipped tests for {}\n",
            "warning:".yellow().bold(),
            summary.synthesis_fallbacks.join(", ")
        ));
    }
    if summary.composition_fallback {
        output.push_str(&format!(
            "{} module assembled by concatenation\n",
            "warning:".yellow().bold()
        ));
    }
    output
}

pub fn format_run_summary_json(summary: &RunSummary, output_path: &Path) -> String {
    let out = json!({
        "output": output_path,
        "summary": summary,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
