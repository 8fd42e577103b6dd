//! Command preview: assemble the form and print the command it would run.

use crate::app::{AppContext, AppPaths, FormState};
use crate::cli::common::{print_json, CliError, CliResult, FormArgs};
use crate::server::{BuiltCommand, OffloadMode, ShellStyle};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;

/// Show the llama-server command for the given options
#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    form: FormArgs,

    /// Shell syntax for the rendered command (defaults to the platform's)
    #[arg(long, value_enum, value_name = "SHELL")]
    shell: Option<ShellArg>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Copy the rendered command to the clipboard
    #[arg(long)]
    copy: bool,
}

/// Shell syntax choices.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellArg {
    /// `$env:NAME = 'value'; ...`
    Powershell,
    /// `NAME='value' ...`
    Posix,
}

impl From<ShellArg> for ShellStyle {
    fn from(shell: ShellArg) -> Self {
        match shell {
            ShellArg::Powershell => Self::PowerShell,
            ShellArg::Posix => Self::Posix,
        }
    }
}

#[derive(Serialize, Debug)]
struct PreviewOutput<'a> {
    argv: &'a [String],
    env: &'a BTreeMap<String, String>,
    offload: OffloadMode,
    display: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleared_mmproj: Option<&'a str>,
}

/// Everything needed to start the server for one invocation.
pub(crate) struct PreparedLaunch {
    pub context: AppContext,
    pub form: FormState,
    pub command: BuiltCommand,
    pub cleared_mmproj: Option<String>,
}

/// Assembles the form, restricts the projector to the model's companions,
/// and builds the command.
pub(crate) fn prepare(paths: &AppPaths, form: &FormArgs) -> CliResult<PreparedLaunch> {
    let (context, mut form) = form.assemble(paths)?;
    let scan = context.scanner().scan();
    let cleared_mmproj = form.reconcile(&scan);
    let command = context.command_builder().build(form.values());

    Ok(PreparedLaunch {
        context,
        form,
        command,
        cleared_mmproj,
    })
}

impl PreviewArgs {
    /// Execute preview command
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let prepared = prepare(paths, &self.form)?;
        let style = self.shell.map_or_else(ShellStyle::native, ShellStyle::from);
        let display = prepared.command.display_string(style);

        if self.copy {
            copy_to_clipboard(&display)?;
        }

        if self.json {
            return print_json(&PreviewOutput {
                argv: prepared.command.argv(),
                env: prepared.command.added_env(),
                offload: prepared.command.offload(),
                display: &display,
                cleared_mmproj: prepared.cleared_mmproj.as_deref(),
            });
        }

        if let Some(projector) = &prepared.cleared_mmproj {
            eprintln!("Note: projector '{projector}' is not next to the selected model and was dropped");
        }
        println!("{display}");
        if self.copy {
            eprintln!("Copied to clipboard.");
        }
        Ok(())
    }
}

fn copy_to_clipboard(text: &str) -> CliResult<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| CliError::io(format!("Clipboard is not available: {e}")))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| CliError::io(format!("Failed to copy to clipboard: {e}")))
}
