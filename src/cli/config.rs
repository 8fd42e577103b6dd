//! Settings CLI commands.

use crate::app::{AppContext, AppPaths};
use crate::cli::common::{print_json, CliError, CliResult};
use crate::constants::APP_NAME;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Show or change where the server and models live
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current settings
    Show(ConfigShowArgs),
    /// Set settings values
    Set(ConfigSetArgs),
}

/// Display current settings
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set settings values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Directory containing the llama-server executable
    #[arg(long, value_name = "DIR")]
    server_dir: Option<PathBuf>,

    /// Directory scanned for model files
    #[arg(long, value_name = "DIR")]
    models_dir: Option<PathBuf>,
}

#[derive(Serialize, Debug)]
struct ConfigOutput {
    config_dir: String,
    server_dir: String,
    server_dir_configured: bool,
    models_dir: String,
    models_dir_configured: bool,
    executable: String,
    executable_found: bool,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(paths),
            ConfigCommand::Set(args) => args.execute(paths),
        }
    }
}

impl ConfigShowArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let store = paths.settings();
        let settings = store.settings();
        let context = AppContext::new(settings);

        let output = ConfigOutput {
            config_dir: paths.config_dir().display().to_string(),
            server_dir: context.server_dir().display().to_string(),
            server_dir_configured: settings.server_dir.is_some(),
            models_dir: context.models_dir().display().to_string(),
            models_dir_configured: settings.models_dir.is_some(),
            executable: context.executable().display().to_string(),
            executable_found: context.executable().is_file(),
        };

        if self.json {
            return print_json(&output);
        }

        let marker = |configured: bool| if configured { "" } else { " (default)" };
        let title = format!("{APP_NAME} Settings");
        println!("{title}");
        println!("{}", "=".repeat(title.len()));
        println!();
        println!("Config Directory: {}", output.config_dir);
        println!(
            "Server Directory: {}{}",
            output.server_dir,
            marker(output.server_dir_configured)
        );
        println!(
            "Models Directory: {}{}",
            output.models_dir,
            marker(output.models_dir_configured)
        );
        println!(
            "Executable:       {}{}",
            output.executable,
            if output.executable_found {
                ""
            } else {
                " (not found)"
            }
        );
        Ok(())
    }
}

impl ConfigSetArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        if self.server_dir.is_none() && self.models_dir.is_none() {
            return Err(CliError::validation(
                "At least one option must be specified: --server-dir or --models-dir",
            ));
        }

        for dir in [&self.server_dir, &self.models_dir].into_iter().flatten() {
            require_directory(dir)?;
        }

        let mut store = paths.settings();
        store
            .update(|settings| {
                if let Some(dir) = &self.server_dir {
                    settings.server_dir = Some(absolute(dir));
                }
                if let Some(dir) = &self.models_dir {
                    settings.models_dir = Some(absolute(dir));
                }
            })
            .map_err(|e| CliError::io(format!("Failed to save settings: {e:#}")))?;

        println!("Settings updated successfully.");
        Ok(())
    }
}

fn require_directory(dir: &Path) -> CliResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(CliError::validation(format!(
            "Directory does not exist: {}",
            dir.display()
        )))
    }
}

fn absolute(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}
