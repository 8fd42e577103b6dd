//! Profile management CLI commands.

use crate::app::AppPaths;
use crate::cli::common::{print_json, CliError, CliResult, FormArgs};
use crate::models::Profile;
use clap::{Args, Subcommand};
use serde::Serialize;

/// Manage saved launch profiles
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    command: ProfileCommand,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// List profile names
    List(ProfileListArgs),
    /// Show the values stored in a profile
    Show(ProfileShowArgs),
    /// Create a new profile from defaults and overrides
    Create(ProfileWriteArgs),
    /// Create or overwrite a profile
    Save(ProfileWriteArgs),
    /// Delete a profile
    Delete(ProfileDeleteArgs),
    /// Delete every profile
    DeleteAll(ProfileDeleteAllArgs),
}

/// List profile names
#[derive(Args, Debug)]
pub struct ProfileListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Show a profile
#[derive(Args, Debug)]
pub struct ProfileShowArgs {
    /// Profile name
    name: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Write a profile
///
/// The snapshot starts from the layout defaults (or `--profile`), then applies
/// `--model`, `--mmproj`, and every `--set`.
#[derive(Args, Debug)]
pub struct ProfileWriteArgs {
    /// Profile name
    name: String,

    #[command(flatten)]
    form: FormArgs,
}

/// Delete a profile
#[derive(Args, Debug)]
pub struct ProfileDeleteArgs {
    /// Profile name
    name: String,
}

/// Delete every profile
#[derive(Args, Debug)]
pub struct ProfileDeleteAllArgs {
    /// Confirm the deletion
    #[arg(long)]
    yes: bool,
}

#[derive(Serialize, Debug)]
struct ProfileListOutput {
    profiles: Vec<String>,
    count: usize,
}

impl ProfileArgs {
    /// Execute profile subcommand
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        match &self.command {
            ProfileCommand::List(args) => args.execute(paths),
            ProfileCommand::Show(args) => args.execute(paths),
            ProfileCommand::Create(args) => args.execute(paths, false),
            ProfileCommand::Save(args) => args.execute(paths, true),
            ProfileCommand::Delete(args) => args.execute(paths),
            ProfileCommand::DeleteAll(args) => args.execute(paths),
        }
    }
}

impl ProfileListArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let names = paths.profiles().names();

        if self.json {
            return print_json(&ProfileListOutput {
                count: names.len(),
                profiles: names,
            });
        }

        if names.is_empty() {
            println!("No profiles saved.");
        } else {
            for name in &names {
                println!("{name}");
            }
        }
        Ok(())
    }
}

impl ProfileShowArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let profiles = paths.profiles();
        let profile = profiles
            .get(&self.name)
            .ok_or_else(|| CliError::validation(format!("Profile '{}' not found", self.name)))?;

        if self.json {
            return print_json(profile);
        }

        let layout = paths.layout();
        println!("Profile: {}", profile.name);
        for (key, value) in profile.parameters.iter() {
            let rendered = layout
                .find(key)
                .map_or_else(|| value.to_string(), |definition| definition.kind.render(value));
            println!("  {key} = {rendered}");
        }
        Ok(())
    }
}

impl ProfileWriteArgs {
    fn execute(&self, paths: &AppPaths, overwrite: bool) -> CliResult<()> {
        let name = Profile::validate_name(&self.name)
            .map_err(|e| CliError::validation(e.to_string()))?;
        let (_, form) = self.form.assemble(paths)?;
        let mut profiles = paths.profiles();

        let result = if overwrite {
            profiles.upsert(name, form.into_values())
        } else {
            profiles.create(name, form.into_values())
        };
        result.map_err(|e| CliError::store(&e))?;

        println!("Saved profile '{name}'.");
        Ok(())
    }
}

impl ProfileDeleteArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let mut profiles = paths.profiles();
        if !profiles.delete(&self.name).map_err(|e| CliError::store(&e))? {
            return Err(CliError::validation(format!(
                "Profile '{}' not found",
                self.name
            )));
        }
        println!("Deleted profile '{}'.", self.name);
        Ok(())
    }
}

impl ProfileDeleteAllArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        if !self.yes {
            return Err(CliError::validation(
                "Refusing to delete every profile without --yes",
            ));
        }
        let removed = paths
            .profiles()
            .delete_all()
            .map_err(|e| CliError::store(&e))?;
        println!("Deleted {removed} profile(s).");
        Ok(())
    }
}
