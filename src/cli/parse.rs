//! CLI parse: clap types for Axiom. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Axiom CLI - turn requirement documents into executable API test suites
#[derive(Parser, Debug)]
#[command(name = "axiom")]
#[command(about = "Generate pytest suites from markdown acceptance criteria")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a test module from a spec document
    Generate(GenerateArgs),
    /// Show the requirements found in a spec document
    Extract {
        /// Spec document (default from config)
        #[arg(long)]
        spec: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Use the heading parser without calling the generation service
        #[arg(long)]
        offline: bool,
        /// API key for the generation service (falls back to OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Run a generated module with pytest
    Test {
        /// Test module (default from config)
        #[arg(long)]
        suite: Option<PathBuf>,
        /// Host exported to the suite through the override variable
        #[arg(long)]
        host: Option<String>,
        /// Python interpreter
        #[arg(long, default_value = "python")]
        python: String,
    },
    /// Probe the target, generate a module, then run it
    Verify {
        #[command(flatten)]
        generate: GenerateArgs,
        /// Python interpreter
        #[arg(long, default_value = "python")]
        python: String,
    },
    /// Serve the profile fixture service
    Fixture {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Spec document (default from config)
    #[arg(long)]
    pub spec: Option<PathBuf>,
    /// Output module path (default from config)
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Target host baked into the module
    #[arg(long)]
    pub host: Option<String>,
    /// API key for the generation service (falls back to OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
    /// Run summary format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML, credential redacted
    Show,
    /// Validate the effective configuration
    Validate,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
