//! Model discovery command.

use crate::app::{AppContext, AppPaths};
use crate::cli::common::{print_json, CliError, CliResult};
use clap::Args;
use regex::RegexBuilder;
use serde::Serialize;

/// List model files and their projectors
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Only list models whose path matches this pattern (case-insensitive regex)
    #[arg(long, short, value_name = "REGEX")]
    filter: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct ScanOutput<'a> {
    models_dir: String,
    models: Vec<ModelEntry<'a>>,
}

#[derive(Serialize, Debug)]
struct ModelEntry<'a> {
    path: &'a str,
    companions: &'a [String],
}

impl ScanArgs {
    /// Execute scan command
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let filter = self
            .filter
            .as_deref()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| CliError::validation(format!("Invalid filter pattern: {e}")))
            })
            .transpose()?;

        let context = AppContext::new(paths.settings().settings());
        let scan = context.scanner().scan();

        let models: Vec<ModelEntry<'_>> = scan
            .models()
            .iter()
            .filter(|model| filter.as_ref().map_or(true, |regex| regex.is_match(model)))
            .map(|model| ModelEntry {
                path: model,
                companions: scan.companions(model),
            })
            .collect();

        if self.json {
            return print_json(&ScanOutput {
                models_dir: context.models_dir().display().to_string(),
                models,
            });
        }

        if models.is_empty() {
            println!("No models found in {}", context.models_dir().display());
            return Ok(());
        }

        println!("Models in {}:", context.models_dir().display());
        for entry in &models {
            println!("  {}", entry.path);
            for companion in entry.companions {
                println!("      mmproj: {companion}");
            }
        }
        println!();
        println!("{} model(s)", models.len());
        Ok(())
    }
}
