//! Shared plumbing for CLI commands: errors, exit codes, and form options.

use crate::app::{AppContext, AppPaths, FormOverrides, FormState};
use crate::services::store::WriteFailed;
use clap::Args;
use serde::Serialize;
use std::fmt;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Bad input: unknown key, missing model, invalid value
    ValidationError = 1,
    /// Reading or writing a file, clipboard, or terminal failed
    IoError = 2,
    /// An external process could not be started or ended badly
    LaunchError = 3,
}

impl ExitCode {
    /// Numeric code handed to the operating system.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Error reported by a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Exit code class
    pub kind: ExitCode,
    /// Message printed after `Error: `
    pub message: String,
}

impl CliError {
    /// Invalid input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::ValidationError,
            message: message.into(),
        }
    }

    /// Filesystem or device failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// External process failure.
    pub fn launch(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::LaunchError,
            message: message.into(),
        }
    }

    /// Maps a store mutation error: failed writes are I/O errors, anything
    /// else is a rejected edit.
    pub fn store(error: &anyhow::Error) -> Self {
        if error.downcast_ref::<WriteFailed>().is_some() {
            Self::io(format!("{error:#}"))
        } else {
            Self::validation(format!("{error:#}"))
        }
    }

    /// Exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.kind.code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type of CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize output to JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Options that fill the launch form.
#[derive(Args, Debug, Clone, Default)]
pub struct FormArgs {
    /// Start from a saved profile
    #[arg(long, short = 'p', value_name = "NAME")]
    pub profile: Option<String>,

    /// Model path relative to the models directory
    #[arg(long, short = 'm', value_name = "PATH")]
    pub model: Option<String>,

    /// Projector path relative to the models directory (empty to clear)
    #[arg(long, value_name = "PATH")]
    pub mmproj: Option<String>,

    /// Override a parameter (repeatable)
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

impl FormArgs {
    /// Assembles the form from the stored layout, the profile, and the overrides.
    ///
    /// Returns the settings context alongside so callers resolve paths from
    /// the same snapshot.
    pub fn assemble(&self, paths: &AppPaths) -> CliResult<(AppContext, FormState)> {
        let context = AppContext::new(paths.settings().settings());
        let layout = paths.layout();
        let profiles = paths.profiles();

        let profile = match &self.profile {
            Some(name) => Some(
                profiles
                    .get(name)
                    .ok_or_else(|| CliError::validation(format!("Profile '{name}' not found")))?,
            ),
            None => None,
        };

        let overrides = FormOverrides {
            model: self.model.clone(),
            mmproj: self.mmproj.clone(),
            assignments: self.assignments.clone(),
        };
        let form = FormState::assemble(layout.definitions(), profile, &overrides)
            .map_err(|e| CliError::validation(format!("{e:#}")))?;

        Ok((context, form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("x").exit_code(), 1);
        assert_eq!(CliError::io("x").exit_code(), 2);
        assert_eq!(CliError::launch("x").exit_code(), 3);
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn test_store_errors_split_by_cause() {
        let rejected = anyhow::anyhow!("Profile 'Fast' already exists");
        assert_eq!(CliError::store(&rejected).kind, ExitCode::ValidationError);

        let failed = anyhow::anyhow!("Is a directory").context(WriteFailed {
            path: PathBuf::from("profiles.json"),
        });
        let err = CliError::store(&failed);
        assert_eq!(err.kind, ExitCode::IoError);
        assert!(err.message.starts_with("Failed to save profiles.json"));
    }

    #[test]
    fn test_unknown_profile_is_validation_error() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::new(PathBuf::from(temp.path()));
        let args = FormArgs {
            profile: Some("missing".to_string()),
            ..FormArgs::default()
        };

        let err = args.assemble(&paths).unwrap_err();
        assert_eq!(err.kind, ExitCode::ValidationError);
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn test_assignments_reach_form() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::new(temp.path());
        let args = FormArgs {
            model: Some("m.gguf".to_string()),
            assignments: vec!["ctx-size=4096".to_string()],
            ..FormArgs::default()
        };

        let (_, form) = args.assemble(&paths).unwrap();
        assert_eq!(form.values().integer("ctx-size"), Some(4096));
        assert_eq!(form.model().as_deref(), Some("m.gguf"));
    }
}
