//! Integration tests for CLI commands routed through the run context

use super::test_utils::{with_isolated_env, PROFILE_SPEC};
use axiom::cli::{map_error, CliError, Commands, GenerateArgs, OutputFormat, RunContext};
use axiom::config::AxiomConfig;
use axiom::error::{ApiError, PipelineError};
use std::path::PathBuf;
use tempfile::TempDir;

fn workspace_with_spec() -> TempDir {
    let dir = TempDir::new().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("project_sample.md"), PROFILE_SPEC).unwrap();
    dir
}

#[tokio::test]
async fn test_offline_extract_renders_table() {
    let dir = workspace_with_spec();
    let context = RunContext::with_config(dir.path().to_path_buf(), AxiomConfig::default());

    let output = context
        .execute(&Commands::Extract {
            spec: None,
            format: OutputFormat::Text,
            offline: true,
            api_key: None,
        })
        .await
        .unwrap();

    assert!(output.success);
    assert!(output.text.contains("AC-1"));
    assert!(output.text.contains("Update email"));
    assert!(output.text.contains("Total: 2 requirement(s) from the heading parser"));
}

#[tokio::test]
async fn test_offline_extract_of_document_without_headings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# Notes\nNothing to test here.").unwrap();
    let context = RunContext::with_config(dir.path().to_path_buf(), AxiomConfig::default());

    let output = context
        .execute(&Commands::Extract {
            spec: Some(PathBuf::from("notes.md")),
            format: OutputFormat::Json,
            offline: true,
            api_key: None,
        })
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["total"], 0);
    assert_eq!(value["fallback"], true);
}

#[test]
fn test_generate_with_unreachable_service_writes_fallback_suite() {
    let dir = workspace_with_spec();
    let mut config = AxiomConfig::default();
    config.provider.endpoint = Some("http://127.0.0.1:1".to_string());
    let context = RunContext::with_config(dir.path().to_path_buf(), config);

    let output = with_isolated_env(&dir, || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime
            .block_on(context.execute(&Commands::Generate(GenerateArgs {
                host: Some("http://api.test:8080".to_string()),
                format: OutputFormat::Json,
                ..GenerateArgs::default()
            })))
            .unwrap()
    });

    assert!(output.success);
    let value: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["summary"]["functions"][0], "test_ac_1_fallback");
    assert_eq!(value["summary"]["extraction_fallback"], true);

    let module =
        std::fs::read_to_string(dir.path().join("tests/generated_suite_test.py")).unwrap();
    assert!(module.starts_with("# Generated by Axiom Engine (Fallback)"));
    assert!(module.contains("os.getenv('AXIOM_TARGET_HOST', 'http://api.test:8080')"));
    assert_eq!(module.matches("pytest.skip(").count(), 2);
}

#[tokio::test]
async fn test_generate_with_missing_spec_hints_at_flag() {
    let dir = TempDir::new().unwrap();
    let context = RunContext::with_config(dir.path().to_path_buf(), AxiomConfig::default());

    let err = context
        .execute(&Commands::Generate(GenerateArgs {
            spec: Some(PathBuf::from("absent.md")),
            ..GenerateArgs::default()
        }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CliError::Pipeline(PipelineError::DocumentRead { .. })
    ));
    assert!(map_error(&err).contains("--spec"));
    assert!(!dir.path().join("tests/generated_suite_test.py").exists());
}

#[tokio::test]
async fn test_test_command_with_missing_interpreter() {
    let dir = TempDir::new().unwrap();
    let context = RunContext::with_config(dir.path().to_path_buf(), AxiomConfig::default());

    let err = context
        .execute(&Commands::Test {
            suite: None,
            host: Some("http://localhost:9".to_string()),
            python: "axiom-missing-python".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Api(ApiError::Io(_))));
}
