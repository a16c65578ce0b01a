//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::output::CliError;
use crate::cli::parse::{Commands, ConfigCommands, GenerateArgs, OutputFormat};
use crate::cli::presentation::{
    format_probe_result, format_requirements_json, format_requirements_text,
    format_run_summary_json, format_run_summary_text, format_suite_report,
    format_validation_errors,
};
use crate::cli::help::command_name;
use crate::config::{AxiomConfig, ConfigLoader};
use crate::error::{ApiError, PipelineError};
use crate::generation::extractor::parse_headings;
use crate::generation::{run, RequirementExtraction, RequirementExtractor, RunRequest, StageSettings};
use crate::provider::{resolve_credential, ModelProviderClient, ProviderFactory};
use crate::verify::{probe_target, SuiteRunner};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Rendered command output and whether the command counts as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: workspace and the effective configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: AxiomConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: AxiomConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &AxiomConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, CliError> {
        let name = command_name(command);
        let started = Instant::now();
        let result = self
            .execute_inner(command)
            .instrument(info_span!("command", command = name))
            .await;
        info!(
            command = name,
            ok = result.as_ref().map(|o| o.success).unwrap_or(false),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, CliError> {
        match command {
            Commands::Generate(args) => self.handle_generate(args).await,
            Commands::Extract {
                spec,
                format,
                offline,
                api_key,
            } => {
                self.handle_extract(spec.as_deref(), *format, *offline, api_key.as_deref())
                    .await
            }
            Commands::Test { suite, host, python } => {
                self.handle_test(suite.as_deref(), host.as_deref(), python)
            }
            Commands::Verify { generate, python } => self.handle_verify(generate, python).await,
            Commands::Fixture { bind } => self.handle_fixture(*bind).await,
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    /// Relative paths are taken from the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn ensure_valid_config(&self) -> Result<(), CliError> {
        self.config
            .validate()
            .map_err(|errors| CliError::InvalidConfig(format_validation_errors(&errors)))
    }

    fn stage_settings(&self) -> StageSettings {
        StageSettings {
            options: self.config.provider.default_options.clone(),
            log_payloads: self.config.pipeline.log_payloads,
        }
    }

    fn run_request(&self, args: &GenerateArgs) -> RunRequest {
        let pipeline = &self.config.pipeline;
        RunRequest {
            spec_path: self.resolve(
                args.spec
                    .as_deref()
                    .unwrap_or(pipeline.spec_path.as_path()),
            ),
            output_path: self.resolve(
                args.output
                    .as_deref()
                    .unwrap_or(pipeline.output_path.as_path()),
            ),
            target_host: args
                .host
                .clone()
                .unwrap_or_else(|| pipeline.target_host.clone()),
            credential: args
                .api_key
                .clone()
                .or_else(|| self.config.provider.api_key.clone()),
            provider: self.config.provider.clone(),
            settings: self.stage_settings(),
            host_override_var: pipeline.host_override_var.clone(),
        }
    }

    async fn handle_generate(&self, args: &GenerateArgs) -> Result<CommandOutput, CliError> {
        self.ensure_valid_config()?;
        let request = self.run_request(args);
        let summary = run(&request).await?;
        let text = match args.format {
            OutputFormat::Text => format_run_summary_text(&summary, &request.output_path),
            OutputFormat::Json => format_run_summary_json(&summary, &request.output_path),
        };
        Ok(CommandOutput::ok(text))
    }

    async fn handle_extract(
        &self,
        spec: Option<&Path>,
        format: OutputFormat,
        offline: bool,
        api_key: Option<&str>,
    ) -> Result<CommandOutput, CliError> {
        let spec_path =
            self.resolve(spec.unwrap_or(self.config.pipeline.spec_path.as_path()));
        let document = std::fs::read_to_string(&spec_path).map_err(|source| {
            PipelineError::DocumentRead {
                path: spec_path.clone(),
                source,
            }
        })?;

        let (requirements, fallback) = if offline {
            (parse_headings(&document), true)
        } else {
            self.ensure_valid_config()?;
            let explicit = api_key
                .map(str::to_string)
                .or_else(|| self.config.provider.api_key.clone());
            let credential = resolve_credential(explicit.as_deref());
            let model_provider = self.config.provider.to_model_provider(credential);
            let provider: Arc<dyn ModelProviderClient> =
                Arc::from(ProviderFactory::create_client(&model_provider)?);
            let extractor = RequirementExtractor::new(provider, self.stage_settings());
            let outcome = extractor.extract(&document).await;
            let fallback = outcome.is_fallback();
            (outcome.into_value(), fallback)
        };

        let text = match format {
            OutputFormat::Text => format_requirements_text(&requirements, fallback),
            OutputFormat::Json => format_requirements_json(&requirements, fallback),
        };
        Ok(CommandOutput::ok(text))
    }

    fn handle_test(
        &self,
        suite: Option<&Path>,
        host: Option<&str>,
        python: &str,
    ) -> Result<CommandOutput, CliError> {
        let suite_path =
            self.resolve(suite.unwrap_or(self.config.pipeline.output_path.as_path()));
        let mut runner = SuiteRunner::new(python);
        if let Some(host) = host {
            runner = runner.with_env(self.config.pipeline.host_override_var.clone(), host);
        }
        let report = runner.run(&suite_path)?;
        Ok(CommandOutput {
            text: format_suite_report(&report),
            success: report.passed,
        })
    }

    async fn handle_verify(
        &self,
        args: &GenerateArgs,
        python: &str,
    ) -> Result<CommandOutput, CliError> {
        self.ensure_valid_config()?;
        let request = self.run_request(args);

        let reachable = probe_target(&request.target_host).await;
        let mut text = format_probe_result(&request.target_host, reachable);
        text.push_str("\n\n");

        let summary = run(&request).await?;
        text.push_str(&match args.format {
            OutputFormat::Text => format_run_summary_text(&summary, &request.output_path),
            OutputFormat::Json => format_run_summary_json(&summary, &request.output_path),
        });
        text.push('\n');

        let report = SuiteRunner::new(python)
            .with_env(request.host_override_var.clone(), request.target_host.clone())
            .run(&request.output_path)?;
        text.push_str(&format_suite_report(&report));

        Ok(CommandOutput {
            text,
            success: report.passed,
        })
    }

    async fn handle_fixture(&self, bind: SocketAddr) -> Result<CommandOutput, CliError> {
        crate::fixture::serve(bind).await.map_err(ApiError::Io)?;
        Ok(CommandOutput::ok("Fixture service stopped".to_string()))
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<CommandOutput, CliError> {
        match command {
            ConfigCommands::Show => Ok(CommandOutput::ok(self.config.to_redacted_toml()?)),
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok(CommandOutput::ok("Configuration is valid".to_string())),
                Err(errors) => Ok(CommandOutput {
                    text: format!(
                        "Configuration has {} problem(s):\n{}",
                        errors.len(),
                        format_validation_errors(&errors)
                    ),
                    success: false,
                }),
            },
        }
    }
}
