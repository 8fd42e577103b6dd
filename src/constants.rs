//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name, on-disk document names, and the
//! fixed values of the llama-server command line.

use std::time::Duration;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "Llama Launcher";

/// The binary name of the application (used in command examples, lowercase with hyphens).
pub const APP_BINARY_NAME: &str = "llama-launcher";

/// Directory name under the platform config dir holding all documents.
pub const APP_CONFIG_DIR_NAME: &str = "LlamaLauncher";

/// Environment variable overriding the config directory (used by tests and portable installs).
pub const CONFIG_DIR_ENV: &str = "LLAMA_LAUNCHER_CONFIG_DIR";

/// Settings document file name.
pub const SETTINGS_FILE: &str = "settings.json";
/// Profiles document file name.
pub const PROFILES_FILE: &str = "profiles.json";
/// Parameter layout document file name.
pub const LAYOUT_FILE: &str = "gui_layout.json";
/// Theme document file name.
pub const THEME_FILE: &str = "theme.json";

/// Server executable file name.
#[cfg(windows)]
pub const SERVER_EXECUTABLE: &str = "llama-server.exe";
/// Server executable file name.
#[cfg(not(windows))]
pub const SERVER_EXECUTABLE: &str = "llama-server";

/// Default models folder name, relative to the server directory.
pub const DEFAULT_MODELS_DIR_NAME: &str = "models";

/// Extension of model files picked up by the scanner (compared case-insensitively).
pub const MODEL_EXTENSION: &str = "gguf";

/// Filename markers identifying multimodal projector files.
pub const PROJECTOR_MARKERS: &[&str] = &["mmproj"];

/// llama-server's built-in `--fit-target` value in MiB.
pub const DEFAULT_FIT_TARGET_MIB: i64 = 1024;

/// Host binding used when the server is exposed to the network.
pub const NETWORK_HOST: &str = "0.0.0.0";

/// Environment variable llama-server reads chat template kwargs from.
pub const CHAT_TEMPLATE_KWARGS_ENV: &str = "LLAMA_CHAT_TEMPLATE_KWARGS";

/// Reasoning effort levels forwarded to the chat template.
pub const REASONING_EFFORT_LEVELS: &[&str] = &["low", "medium", "high"];

/// Port used when neither the form nor the command line names one.
pub const DEFAULT_PORT: u16 = 8080;

/// Interval between liveness checks of the running server.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// GPU monitor command and its arguments.
pub const GPU_MONITOR_COMMAND: (&str, &[&str]) = ("nvidia-smi", &["-l", "1"]);
