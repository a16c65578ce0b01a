//! CLI command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string recorded on the command span (e.g. "generate", "config.show").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate(_) => "generate",
        Commands::Extract { .. } => "extract",
        Commands::Test { .. } => "test",
        Commands::Verify { .. } => "verify",
        Commands::Fixture { .. } => "fixture",
        Commands::Config { command } => match command {
            ConfigCommands::Show => "config.show",
            ConfigCommands::Validate => "config.validate",
        },
    }
}
