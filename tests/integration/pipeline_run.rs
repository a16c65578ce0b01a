//! Integration tests for full pipeline runs against a scripted generation service

use super::test_utils::{
    requirements_reply, scenario_reply, unit_reply, ScriptedProvider, PROFILE_SPEC,
};
use axiom::error::PipelineError;
use axiom::generation::{run_with_provider, RunRequest};
use std::sync::Arc;
use tempfile::TempDir;

const READ_PROFILE: &str = r#"def test_read_profile():
    r = httpx.get(f"{BASE_URL}/profile", headers={"Authorization": "Bearer abc"})
    assert r.status_code == 200, f"Unexpected body: {r.json()['email']}""#;

const UPDATE_EMAIL: &str = r#"def test_update_email():
    r = httpx.put(f"{BASE_URL}/profile", json={"email": "new@example.com"}, headers={"Authorization": "Bearer abc"})
    assert r.json()["email"] == "new@example.com", f"Got {r.json()['email']}""#;

fn request(dir: &TempDir) -> RunRequest {
    let spec = dir.path().join("docs").join("spec.md");
    std::fs::create_dir_all(spec.parent().unwrap()).unwrap();
    std::fs::write(&spec, PROFILE_SPEC).unwrap();
    RunRequest::new(
        spec,
        dir.path().join("tests").join("generated_suite_test.py"),
        "http://localhost:8000",
    )
}

fn host_definitions(module: &str) -> usize {
    module
        .lines()
        .filter(|line| line.starts_with("BASE_URL =") || line.starts_with("BASE_URL="))
        .count()
}

#[tokio::test]
async fn test_fully_generated_suite() {
    let dir = TempDir::new().unwrap();
    let request = request(&dir);
    let composed = format!(
        "Here is the merged module:\n```python\nimport pytest\nimport httpx\n\n{}\n\n{}\n```\nLet me know if you need changes.",
        READ_PROFILE, UPDATE_EMAIL
    );
    let provider = Arc::new(ScriptedProvider::new(vec![
        requirements_reply(&[("AC-1", "Read profile"), ("AC-2", "Update email")]),
        scenario_reply("AC-1"),
        unit_reply("test_read_profile", READ_PROFILE),
        scenario_reply("AC-2"),
        unit_reply("test_update_email", UPDATE_EMAIL),
        Ok(composed),
    ]));

    let summary = run_with_provider(&request, provider.clone()).await.unwrap();

    assert!(summary.fully_generated());
    assert_eq!(summary.requirement_count, 2);
    assert_eq!(summary.functions, vec!["test_read_profile", "test_update_email"]);
    assert_eq!(provider.call_count(), 6);

    let module = std::fs::read_to_string(&request.output_path).unwrap();
    assert!(module.starts_with("# Generated by Axiom Engine\nimport os\n"));
    assert_eq!(host_definitions(&module), 1);
    assert!(module.contains("BASE_URL = os.getenv('AXIOM_TARGET_HOST', 'http://localhost:8000')"));
    let read = module.find("def test_read_profile(").unwrap();
    let update = module.find("def test_update_email(").unwrap();
    assert!(read < update);
    assert!(!module.contains("Let me know"));

    let synthesis_prompt = provider.prompt(2);
    assert!(synthesis_prompt[0]
        .content
        .contains("BASE_URL = 'http://localhost:8000'"));
}

#[tokio::test]
async fn test_offline_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let first = request(&dir);
    let mut second = first.clone();
    second.output_path = dir.path().join("second_test.py");

    let summary = run_with_provider(&first, Arc::new(ScriptedProvider::offline()))
        .await
        .unwrap();
    run_with_provider(&second, Arc::new(ScriptedProvider::offline()))
        .await
        .unwrap();

    assert!(summary.extraction_fallback);
    assert!(summary.composition_fallback);
    assert_eq!(summary.scenario_fallbacks, vec!["AC-1", "AC-2"]);
    assert_eq!(
        summary.functions,
        vec!["test_ac_1_fallback", "test_ac_2_fallback"]
    );

    let a = std::fs::read_to_string(&first.output_path).unwrap();
    let b = std::fs::read_to_string(&second.output_path).unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("# Generated by Axiom Engine (Fallback)"));
    assert_eq!(host_definitions(&a), 1);
    assert_eq!(a.matches("pytest.skip(").count(), 2);
}

#[tokio::test]
async fn test_quote_collision_becomes_skipped_test() {
    let dir = TempDir::new().unwrap();
    let request = request(&dir);
    let colliding = "def test_update_email():\n    data = {}\n    assert False, f\"Got {data[\"email\"]}\"";
    let provider = Arc::new(ScriptedProvider::new(vec![
        requirements_reply(&[("AC-1", "Read profile"), ("AC-2", "Update email")]),
        scenario_reply("AC-1"),
        unit_reply("test_read_profile", READ_PROFILE),
        scenario_reply("AC-2"),
        unit_reply("test_update_email", colliding),
    ]));

    let summary = run_with_provider(&request, provider).await.unwrap();

    assert_eq!(summary.synthesis_fallbacks, vec!["AC-2"]);
    assert!(summary.composition_fallback);
    let module = std::fs::read_to_string(&request.output_path).unwrap();
    assert!(module.contains("def test_read_profile("));
    assert!(module.contains("def test_ac_2_fallback("));
    assert!(!module.contains("data[\"email\"]"));
    assert_eq!(module.matches("pytest.skip(").count(), 1);
}

#[tokio::test]
async fn test_composer_dropping_a_function_falls_back() {
    let dir = TempDir::new().unwrap();
    let request = request(&dir);
    let provider = Arc::new(ScriptedProvider::new(vec![
        requirements_reply(&[("AC-1", "Read profile"), ("AC-2", "Update email")]),
        scenario_reply("AC-1"),
        unit_reply("test_read_profile", READ_PROFILE),
        scenario_reply("AC-2"),
        unit_reply("test_update_email", UPDATE_EMAIL),
        Ok(format!("```python\nimport httpx\n\n{}\n```", READ_PROFILE)),
    ]));

    let summary = run_with_provider(&request, provider).await.unwrap();

    assert!(summary.composition_fallback);
    let module = std::fs::read_to_string(&request.output_path).unwrap();
    assert!(module.contains("def test_read_profile("));
    assert!(module.contains("def test_update_email("));
}

#[tokio::test]
async fn test_unreadable_document_is_the_only_failure() {
    let dir = TempDir::new().unwrap();
    let request = RunRequest::new(
        dir.path().join("missing.md"),
        dir.path().join("out_test.py"),
        "http://localhost:8000",
    );
    let provider = Arc::new(ScriptedProvider::offline());

    let err = run_with_provider(&request, provider.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DocumentRead { .. }));
    assert_eq!(provider.call_count(), 0);
    assert!(!request.output_path.exists());
}

#[tokio::test]
async fn test_unwritable_output_reports_module_write() {
    let dir = TempDir::new().unwrap();
    let mut request = request(&dir);
    // A regular file where a parent directory is required
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    request.output_path = blocker.join("suite_test.py");

    let err = run_with_provider(&request, Arc::new(ScriptedProvider::offline()))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ModuleWrite { .. }));
}

#[tokio::test]
async fn test_uncollected_function_still_yields_one_test_per_requirement() {
    let dir = TempDir::new().unwrap();
    let request = request(&dir);
    let helper = "def check_profile():\n    assert httpx.get(f\"{BASE_URL}/profile\")";
    let provider = Arc::new(ScriptedProvider::new(vec![
        requirements_reply(&[("AC-1", "Read profile"), ("AC-2", "Update email")]),
        scenario_reply("AC-1"),
        unit_reply("check_profile", helper),
        scenario_reply("AC-2"),
        unit_reply("test_update_email", UPDATE_EMAIL),
        Ok(format!(
            "```python\nimport httpx\n\n{}\n\n{}\n```",
            helper, UPDATE_EMAIL
        )),
    ]));

    let summary = run_with_provider(&request, provider).await.unwrap();

    assert_eq!(summary.synthesis_fallbacks, vec!["AC-1"]);
    let module = std::fs::read_to_string(&request.output_path).unwrap();
    let defs: Vec<&str> = module
        .lines()
        .filter(|line| line.starts_with("def test"))
        .collect();
    assert_eq!(defs.len(), 2);
    assert!(!module.contains("def check_profile("));
}
