//! Parameter layout CLI commands.

use crate::app::AppPaths;
use crate::cli::common::{print_json, CliError, CliResult};
use crate::models::{ParamKind, ParameterDefinition};
use clap::{Args, Subcommand};
use serde_json::Value;

/// Edit the list of launch form parameters
#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(subcommand)]
    command: ParamsCommand,
}

#[derive(Subcommand, Debug)]
enum ParamsCommand {
    /// List parameters in form order
    List(ParamsListArgs),
    /// Append a parameter
    Add(ParamsAddArgs),
    /// Change the label or default of a parameter
    Edit(ParamsEditArgs),
    /// Remove a parameter
    Remove(ParamsRemoveArgs),
    /// Move a parameter to a new position (0-based)
    Move(ParamsMoveArgs),
    /// Restore the built-in parameter list
    Reset,
}

/// List parameters
#[derive(Args, Debug)]
pub struct ParamsListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Append a parameter
#[derive(Args, Debug)]
pub struct ParamsAddArgs {
    /// Unique key (also the llama-server flag name for table-driven flags)
    #[arg(long)]
    key: String,

    /// Label shown next to the field
    #[arg(long)]
    label: String,

    /// Value type: text, int, float, bool, or choice
    #[arg(long = "type", value_name = "TYPE", default_value = "text")]
    type_name: String,

    /// Default value
    #[arg(long)]
    default: Option<String>,

    /// Comma-separated options for choice parameters
    #[arg(long, value_delimiter = ',')]
    options: Vec<String>,
}

/// Edit a parameter
#[derive(Args, Debug)]
pub struct ParamsEditArgs {
    /// Parameter key
    key: String,

    /// New label
    #[arg(long)]
    label: Option<String>,

    /// New default value
    #[arg(long)]
    default: Option<String>,
}

/// Remove a parameter
#[derive(Args, Debug)]
pub struct ParamsRemoveArgs {
    /// Parameter key
    key: String,
}

/// Move a parameter
#[derive(Args, Debug)]
pub struct ParamsMoveArgs {
    /// Parameter key
    key: String,

    /// Target position
    index: usize,
}

impl ParamsArgs {
    /// Execute params subcommand
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        match &self.command {
            ParamsCommand::List(args) => args.execute(paths),
            ParamsCommand::Add(args) => args.execute(paths),
            ParamsCommand::Edit(args) => args.execute(paths),
            ParamsCommand::Remove(args) => args.execute(paths),
            ParamsCommand::Move(args) => args.execute(paths),
            ParamsCommand::Reset => {
                paths.layout().reset().map_err(|e| CliError::store(&e))?;
                println!("Restored the built-in parameter list.");
                Ok(())
            }
        }
    }
}

impl ParamsListArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let layout = paths.layout();
        if self.json {
            return print_json(&layout.definitions());
        }

        for (index, definition) in layout.definitions().iter().enumerate() {
            let default = definition.kind.render(&definition.default);
            let options = definition
                .kind
                .options()
                .filter(|options| !options.is_empty())
                .map(|options| format!(" [{}]", options.join("|")))
                .unwrap_or_default();
            println!(
                "{index:>3}  {:<20} {:<7} {:<24} {}{options}",
                definition.key,
                definition.kind.type_name(),
                if default.is_empty() { "-" } else { default.as_str() },
                definition.label,
            );
        }
        Ok(())
    }
}

impl ParamsAddArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let options = (!self.options.is_empty()).then(|| self.options.clone());
        let kind = ParamKind::from_parts(&self.type_name, options)
            .map_err(|e| CliError::validation(e.to_string()))?;
        let default = match &self.default {
            Some(raw) => kind
                .parse(raw)
                .map_err(|e| CliError::validation(format!("Invalid default: {e}")))?,
            None => Value::Null,
        };

        let definition = ParameterDefinition::new(&self.label, self.key.trim(), kind, default);
        paths
            .layout()
            .add(definition)
            .map_err(|e| CliError::store(&e))?;

        println!("Added parameter '{}'.", self.key.trim());
        Ok(())
    }
}

impl ParamsEditArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        if self.label.is_none() && self.default.is_none() {
            return Err(CliError::validation(
                "At least one option must be specified: --label or --default",
            ));
        }

        let mut layout = paths.layout();
        let mut definition = layout
            .find(&self.key)
            .cloned()
            .ok_or_else(|| CliError::validation(format!("Parameter '{}' not found", self.key)))?;

        if let Some(label) = &self.label {
            definition.label.clone_from(label);
        }
        if let Some(raw) = &self.default {
            definition.default = definition
                .parse(raw)
                .map_err(|e| CliError::validation(format!("{e:#}")))?;
        }

        layout
            .replace(definition)
            .map_err(|e| CliError::store(&e))?;
        println!("Updated parameter '{}'.", self.key);
        Ok(())
    }
}

impl ParamsRemoveArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let removed = paths
            .layout()
            .remove(&self.key)
            .map_err(|e| CliError::store(&e))?;
        println!("Removed parameter '{}' ({}).", removed.key, removed.label);
        Ok(())
    }
}

impl ParamsMoveArgs {
    fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        paths
            .layout()
            .move_to(&self.key, self.index)
            .map_err(|e| CliError::store(&e))?;
        println!("Moved parameter '{}' to position {}.", self.key, self.index);
        Ok(())
    }
}
