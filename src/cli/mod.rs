//! CLI command handlers for llama-launcher.
//!
//! Every subcommand loads the documents it needs from [`AppPaths`], does its
//! work, and reports failures as a [`CliError`] carrying the exit code.

pub mod chat;
pub mod common;
pub mod config;
pub mod launch;
pub mod params;
pub mod preview;
pub mod profile;
pub mod scan;
pub mod style;
pub mod theme;

// Re-export types used by main.rs and tests
pub use chat::{ChatArgs, GpuMonitorArgs};
pub use common::{CliError, CliResult, ExitCode, FormArgs};
pub use config::ConfigArgs;
pub use launch::LaunchArgs;
pub use params::ParamsArgs;
pub use preview::PreviewArgs;
pub use profile::ProfileArgs;
pub use scan::ScanArgs;
pub use theme::ThemeArgs;

use crate::app::AppPaths;
use crate::constants::APP_BINARY_NAME;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Profile-driven launcher for llama-server
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding settings, profiles, layout, and theme
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List model files and their projectors
    Scan(ScanArgs),
    /// Show the llama-server command for the given options
    Preview(PreviewArgs),
    /// Launch llama-server and supervise it
    Launch(LaunchArgs),
    /// Manage saved launch profiles
    Profile(ProfileArgs),
    /// Show or change where the server and models live
    Config(ConfigArgs),
    /// Edit the list of launch form parameters
    Params(ParamsArgs),
    /// Show or edit the theme document
    Theme(ThemeArgs),
    /// Open the chat page in the browser
    Chat(ChatArgs),
    /// Start the GPU monitor
    GpuMonitor(GpuMonitorArgs),
}

impl Cli {
    /// Runs the selected subcommand.
    pub fn run(&self) -> CliResult<()> {
        let paths = AppPaths::resolve(self.config_dir.as_deref())
            .map_err(|e| CliError::io(format!("{e:#}")))?;

        match &self.command {
            Command::Scan(args) => args.execute(&paths),
            Command::Preview(args) => args.execute(&paths),
            Command::Launch(args) => args.execute(&paths),
            Command::Profile(args) => args.execute(&paths),
            Command::Config(args) => args.execute(&paths),
            Command::Params(args) => args.execute(&paths),
            Command::Theme(args) => args.execute(&paths),
            Command::Chat(args) => args.execute(&paths),
            Command::GpuMonitor(args) => args.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "llama-launcher",
            "preview",
            "--set",
            "port=9000",
            "-s",
            "ngl=10",
            "--config-dir",
            "/tmp/ll",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/ll")));
        assert!(matches!(cli.command, Command::Preview(_)));
    }
}
