//! llama-server command line construction.
//!
//! [`CommandBuilder::build`] maps form values to an argument list and the
//! environment additions. It never fails: missing, empty, or malformed values
//! are left out of the command so a launch is never blocked by the builder.

use crate::constants::{
    CHAT_TEMPLATE_KWARGS_ENV, DEFAULT_FIT_TARGET_MIB, NETWORK_HOST, REASONING_EFFORT_LEVELS,
};
use crate::models::{keys, ParameterValues};
use crate::services::scanner::resolve_relative;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// A `key -> --flag value` entry of the table-driven pass.
struct FlagMapping {
    key: &'static str,
    flag: &'static str,
    /// Manual GPU placement flag; never emitted in fit mode
    placement: bool,
}

const fn flag(key: &'static str, flag: &'static str) -> FlagMapping {
    FlagMapping {
        key,
        flag,
        placement: false,
    }
}

const fn placement(key: &'static str, flag: &'static str) -> FlagMapping {
    FlagMapping {
        key,
        flag,
        placement: true,
    }
}

const FLAG_TABLE: &[FlagMapping] = &[
    flag("reasoning-format", "--reasoning-format"),
    flag(keys::PORT, "--port"),
    flag("ctx-size", "--ctx-size"),
    flag("ub", "-ub"),
    placement(keys::GPU_LAYERS, "-ngl"),
    flag("temp", "--temp"),
    flag("top-p", "--top-p"),
    flag("min-p", "--min-p"),
    flag("top-k", "--top-k"),
    flag("repeat-penalty", "--repeat-penalty"),
    placement(keys::SPLIT_MODE, "--split-mode"),
    placement(keys::MAIN_GPU, "--main-gpu"),
    placement(keys::TENSOR_SPLIT, "-ts"),
    flag("ctk", "-ctk"),
    flag("ctv", "-ctv"),
];

/// Flags that pin layers to devices and therefore disable automatic fitting.
pub const PLACEMENT_FLAGS: &[&str] = &["-ngl", "--split-mode", "--main-gpu", "-ts", "--n-cpu-moe"];

/// How model layers are distributed over devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OffloadMode {
    /// llama-server sizes the offload itself (`--fit`)
    Fit,
    /// Layers are placed explicitly with `-ngl` and friends
    Manual,
}

impl OffloadMode {
    /// Reads the discriminator; anything other than `fit` is manual.
    #[must_use]
    pub fn from_values(values: &ParameterValues) -> Self {
        match values.text(keys::OFFLOAD_MODE) {
            Some(mode) if mode.trim().eq_ignore_ascii_case("fit") => Self::Fit,
            _ => Self::Manual,
        }
    }
}

/// Shell syntax used by [`BuiltCommand::display_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStyle {
    /// `$env:NAME = 'value'; program args`
    PowerShell,
    /// `NAME='value' program args`
    Posix,
}

impl ShellStyle {
    /// The shell a user of this platform most likely pastes into.
    #[must_use]
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }
}

/// Builds server commands for one executable and models root.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    executable: PathBuf,
    models_root: PathBuf,
    base_env: BTreeMap<String, String>,
}

impl CommandBuilder {
    /// Creates a builder that extends the current process environment.
    pub fn new(executable: impl Into<PathBuf>, models_root: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            models_root: models_root.into(),
            base_env: std::env::vars().collect(),
        }
    }

    /// Replaces the inherited environment the command extends.
    #[must_use]
    pub fn with_base_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.base_env = env
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Executable the commands start.
    #[must_use]
    pub fn executable(&self) -> &std::path::Path {
        &self.executable
    }

    /// Builds the argument list and environment for `values`.
    #[must_use]
    pub fn build(&self, values: &ParameterValues) -> BuiltCommand {
        let mut argv = vec![self.executable.to_string_lossy().into_owned()];
        let mut push = |flag: &str, value: Option<String>| {
            argv.push(flag.to_string());
            if let Some(value) = value {
                argv.push(value);
            }
        };

        if let Some(model) = values.text(keys::MODEL) {
            push("-m", Some(self.resolve(&model)));
        }

        if let Some(projector) = values.text(keys::MMPROJ) {
            push("--mmproj", Some(self.resolve(&projector)));
        }

        // Absent means llama-server's default (enabled); only an explicit false disables it
        match values.flag(keys::JINJA) {
            Some(false) => push("--no-jinja", None),
            _ => push("--jinja", None),
        }

        if values.flag(keys::HOST_ALL) == Some(true) {
            push("--host", Some(NETWORK_HOST.to_string()));
        }

        if let Some(mode) = flash_attention_mode(values) {
            push("--flash-attn", Some(mode.to_string()));
        }

        let offload = OffloadMode::from_values(values);
        match offload {
            OffloadMode::Fit => {
                if let Some(target) = values
                    .integer(keys::FIT_TARGET)
                    .filter(|target| *target != DEFAULT_FIT_TARGET_MIB)
                {
                    push("--fit-target", Some(target.to_string()));
                }
            }
            OffloadMode::Manual => {
                push("--fit", Some("off".to_string()));
                if let Some(layers) = values.integer(keys::N_CPU_MOE).filter(|n| *n > 0) {
                    push("--n-cpu-moe", Some(layers.to_string()));
                }
            }
        }

        for mapping in FLAG_TABLE {
            if mapping.placement && offload == OffloadMode::Fit {
                continue;
            }
            if let Some(value) = values.text(mapping.key) {
                push(mapping.flag, Some(value));
            }
        }

        let mut added_env = BTreeMap::new();
        if let Some(effort) = values
            .text(keys::REASONING_EFFORT)
            .filter(|effort| REASONING_EFFORT_LEVELS.contains(&effort.as_str()))
        {
            let kwargs = serde_json::json!({ "reasoning_effort": effort });
            added_env.insert(CHAT_TEMPLATE_KWARGS_ENV.to_string(), kwargs.to_string());
        }

        debug!(
            "Built command with {} arguments ({:?} offload)",
            argv.len() - 1,
            offload
        );

        BuiltCommand {
            argv,
            offload,
            added_env,
            base_env: self.base_env.clone(),
        }
    }

    fn resolve(&self, relative: &str) -> String {
        resolve_relative(&self.models_root, relative)
            .to_string_lossy()
            .into_owned()
    }
}

/// `--flash-attn` value, only when the caller set the key.
fn flash_attention_mode(values: &ParameterValues) -> Option<&'static str> {
    let is_auto = values
        .get(keys::FLASH_ATTN)?
        .as_str()
        .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("auto"));
    if is_auto {
        return Some("auto");
    }
    values
        .flag(keys::FLASH_ATTN)
        .map(|enabled| if enabled { "on" } else { "off" })
}

/// A ready-to-spawn server command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltCommand {
    argv: Vec<String>,
    offload: OffloadMode,
    #[serde(rename = "env")]
    added_env: BTreeMap<String, String>,
    #[serde(skip)]
    base_env: BTreeMap<String, String>,
}

impl BuiltCommand {
    /// Arbitrary command over the current environment, for process tests.
    #[cfg(test)]
    pub(crate) fn from_argv(argv: &[&str], added_env: &[(&str, &str)]) -> Self {
        Self {
            argv: argv.iter().map(|part| (*part).to_string()).collect(),
            offload: OffloadMode::Manual,
            added_env: added_env
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            base_env: std::env::vars().collect(),
        }
    }

    /// Full argument vector, executable first.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Executable path.
    #[must_use]
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Arguments after the executable.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Offload branch that was taken.
    #[must_use]
    pub fn offload(&self) -> OffloadMode {
        self.offload
    }

    /// Variables added on top of the inherited environment.
    #[must_use]
    pub fn added_env(&self) -> &BTreeMap<String, String> {
        &self.added_env
    }

    /// Complete child environment: inherited variables plus additions.
    #[must_use]
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = self.base_env.clone();
        env.extend(
            self.added_env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        env
    }

    /// Returns true when `flag` appears as an argument.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args().iter().any(|arg| arg == flag)
    }

    /// Value following `flag`, if present.
    #[must_use]
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        let args = self.args();
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|index| args.get(index + 1))
            .map(String::as_str)
    }

    /// Human-readable rendering for previews and logs.
    ///
    /// Arguments containing whitespace are double-quoted. Added variables that
    /// differ from the inherited environment are prefixed as assignments.
    #[must_use]
    pub fn display_string(&self, style: ShellStyle) -> String {
        let mut rendered = String::new();

        for (name, value) in &self.added_env {
            if self.base_env.get(name) == Some(value) {
                continue;
            }
            rendered.push_str(&match style {
                ShellStyle::PowerShell => format!("$env:{name} = '{value}'; "),
                ShellStyle::Posix => format!("{name}='{value}' "),
            });
        }

        let quoted: Vec<String> = self
            .argv
            .iter()
            .map(|part| {
                if part.chars().any(char::is_whitespace) {
                    format!("\"{part}\"")
                } else {
                    part.clone()
                }
            })
            .collect();
        rendered.push_str(&quoted.join(" "));
        rendered
    }
}
