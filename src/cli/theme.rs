//! Theme CLI commands.

use crate::app::AppPaths;
use crate::cli::common::{print_json, CliError, CliResult};
use crate::services::ThemeSection;
use clap::{Args, Subcommand};

/// Show or edit the theme document
#[derive(Args, Debug)]
pub struct ThemeArgs {
    #[command(subcommand)]
    command: ThemeCommand,
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    /// Display the theme
    Show(ThemeShowArgs),
    /// Set one entry, e.g. `colors.window_bg "#000000"`
    Set(ThemeSetArgs),
    /// Restore the default theme
    Reset,
}

/// Display the theme
#[derive(Args, Debug)]
pub struct ThemeShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set one theme entry
#[derive(Args, Debug)]
pub struct ThemeSetArgs {
    /// Entry as SECTION.NAME (sections: colors, fonts, sizes)
    #[arg(value_name = "SECTION.NAME")]
    entry: String,

    /// New value
    value: String,
}

impl ThemeArgs {
    /// Execute theme subcommand
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        match &self.command {
            ThemeCommand::Show(args) => args.execute(paths),
            ThemeCommand::Set(args) => args.execute(paths),
            ThemeCommand::Reset => {
                paths
                    .theme()
                    .reset()
                    .map_err(|e| CliError::io(format!("Failed to save theme: {e:#}")))?;
                println!("Restored the default theme.");
                Ok(())
            }
        }
    }
}

impl ThemeShowArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let store = paths.theme();
        let theme = store.theme();
        if self.json {
            return print_json(&theme.to_value());
        }

        for section in ThemeSection::ALL {
            println!("[{section}]");
            for (name, value) in theme.section(section) {
                println!("  {name} = {value}");
            }
        }
        Ok(())
    }
}

impl ThemeSetArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let (section, name) = parse_entry(&self.entry)?;
        paths
            .theme()
            .set(section, name, &self.value)
            .map_err(|e| CliError::io(format!("Failed to save theme: {e:#}")))?;
        println!("Set {section}.{name} = {}", self.value);
        Ok(())
    }
}

fn parse_entry(entry: &str) -> CliResult<(ThemeSection, &str)> {
    let (section, name) = entry
        .split_once('.')
        .ok_or_else(|| CliError::validation(format!("Expected SECTION.NAME, got '{entry}'")))?;
    let section = section
        .parse::<ThemeSection>()
        .map_err(|e| CliError::validation(e.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::validation("Theme entry name cannot be empty"));
    }
    Ok((section, name))
}
