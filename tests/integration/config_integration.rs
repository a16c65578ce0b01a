//! Integration tests for configuration loading through the CLI run context

use super::test_utils::with_isolated_env;
use axiom::cli::{CliError, Commands, ConfigCommands, RunContext};
use axiom::config::{global_config_path, ConfigLoader};
use axiom::provider::ProviderType;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_workspace_config(root: &std::path::Path, name: &str, body: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[tokio::test]
async fn test_workspace_config_reaches_run_context() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("ws");
    write_workspace_config(
        &workspace,
        "config.toml",
        r#"
[provider]
provider_type = "ollama"
model = "llama3"
api_key = "sk-workspace"

[pipeline]
target_host = "http://staging.internal:9000"
output_path = "generated/api_test.py"
"#,
    );

    let context = with_isolated_env(&dir, || RunContext::new(workspace.clone(), None).unwrap());

    let config = context.config();
    assert_eq!(config.provider.provider_type, ProviderType::Ollama);
    assert_eq!(config.pipeline.target_host, "http://staging.internal:9000");
    assert_eq!(
        config.pipeline.output_path,
        PathBuf::from("generated/api_test.py")
    );
    assert_eq!(config.pipeline.host_override_var, "AXIOM_TARGET_HOST");

    let shown = context
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .await
        .unwrap();
    assert!(shown.success);
    assert!(shown.text.contains("http://staging.internal:9000"));
    assert!(shown.text.contains("<redacted>"));
    assert!(!shown.text.contains("sk-workspace"));
}

#[test]
fn test_global_file_is_overridden_by_workspace() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("ws");
    write_workspace_config(
        &workspace,
        "config.toml",
        "[pipeline]\ntarget_host = \"http://workspace:1\"\n",
    );

    let config = with_isolated_env(&dir, || {
        let global = global_config_path().unwrap();
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(
            &global,
            "[pipeline]\ntarget_host = \"http://global:1\"\nlog_payloads = true\n",
        )
        .unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });

    assert_eq!(config.pipeline.target_host, "http://workspace:1");
    assert!(config.pipeline.log_payloads);
}

#[tokio::test]
async fn test_validate_command_reports_bad_file() {
    let dir = TempDir::new().unwrap();
    let config_file = dir.path().join("axiom.toml");
    std::fs::write(
        &config_file,
        r#"
[provider]
provider_type = "local"

[pipeline]
host_override_var = "not a var"
"#,
    )
    .unwrap();

    let context = RunContext::new(dir.path().to_path_buf(), Some(config_file)).unwrap();
    let output = context
        .execute(&Commands::Config {
            command: ConfigCommands::Validate,
        })
        .await
        .unwrap();

    assert!(!output.success);
    assert!(output.text.contains("2 problem(s)"));
    assert!(output.text.contains("Local provider requires an endpoint"));
    assert!(output.text.contains("not a var"));
}

#[test]
fn test_malformed_explicit_file_fails_context() {
    let dir = TempDir::new().unwrap();
    let config_file = dir.path().join("broken.toml");
    std::fs::write(&config_file, "[pipeline\ntarget_host = ").unwrap();

    let result = RunContext::new(dir.path().to_path_buf(), Some(config_file));
    assert!(matches!(result, Err(CliError::Api(_))));
}

#[test]
fn test_missing_explicit_file_fails_context() {
    let dir = TempDir::new().unwrap();
    let result = RunContext::new(
        dir.path().to_path_buf(),
        Some(dir.path().join("absent.toml")),
    );
    assert!(result.is_err());
}
