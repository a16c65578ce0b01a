//! CLI presentation: text and json formatters per command family.

mod config;
mod generation;
mod suite;

pub use config::format_validation_errors;
pub use generation::{
    format_requirements_json, format_requirements_text, format_run_summary_json,
    format_run_summary_text,
};
pub use suite::{format_probe_result, format_suite_report};
