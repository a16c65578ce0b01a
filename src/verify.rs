//! Suite execution and target reachability, used outside the generation pipeline.

use crate::error::ApiError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of one pytest invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub suite: PathBuf,
    pub passed: bool,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a generated module with `<python> -m pytest <suite> -v`.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    interpreter: String,
    env: Vec<(String, String)>,
}

impl Default for SuiteRunner {
    fn default() -> Self {
        Self::new("python")
    }
}

impl SuiteRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            env: Vec::new(),
        }
    }

    /// Extra variable for the pytest process, e.g. the host override.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Blocks until pytest exits. Only a failure to start the process is an error.
    pub fn run(&self, suite: &Path) -> Result<SuiteReport, ApiError> {
        info!(suite = %suite.display(), interpreter = %self.interpreter, "Running test suite");
        let output = Command::new(&self.interpreter)
            .arg("-m")
            .arg("pytest")
            .arg(suite)
            .arg("-v")
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|e| {
                ApiError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to start {}: {}", self.interpreter, e),
                ))
            })?;

        let report = SuiteReport {
            suite: suite.to_path_buf(),
            passed: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(exit_code = ?report.exit_code, passed = report.passed, "Test suite finished");
        Ok(report)
    }
}

/// Whether anything answers HTTP at `host`. Any status counts as reachable.
pub async fn probe_target(host: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build probe client");
            return false;
        }
    };
    match client.get(host).send().await {
        Ok(response) => {
            debug!(host, status = %response.status(), "Target answered");
            true
        }
        Err(e) => {
            debug!(host, error = %e, "Target unreachable");
            false
        }
    }
}
