//! Application orchestration layer
//!
//! [`AppPaths`] locates the documents, [`AppContext`] carries the directories
//! resolved from settings. Both are built once per command and passed
//! explicitly to whatever needs them.

pub mod form;

pub use form::{FormOverrides, FormState};

use crate::constants::{
    APP_CONFIG_DIR_NAME, CONFIG_DIR_ENV, LAYOUT_FILE, PROFILES_FILE, SERVER_EXECUTABLE,
    SETTINGS_FILE, THEME_FILE,
};
use crate::server::CommandBuilder;
use crate::services::{
    LayoutStore, ModelScanner, ProfileStore, Settings, SettingsStore, ThemeStore,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the persisted documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    /// Uses `config_dir` as-is.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Resolves the config directory.
    ///
    /// Order: the explicit directory, then `LLAMA_LAUNCHER_CONFIG_DIR`, then
    /// the platform config directory:
    /// - Linux: `~/.config/LlamaLauncher/`
    /// - macOS: `~/Library/Application Support/LlamaLauncher/`
    /// - Windows: `%APPDATA%\LlamaLauncher\`
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(dir) = explicit {
            return Ok(Self::new(dir));
        }

        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
            debug!("Using config directory from {CONFIG_DIR_ENV}");
            return Ok(Self::new(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_CONFIG_DIR_NAME);
        Ok(Self::new(config_dir))
    }

    /// Directory holding all documents.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Settings document.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Profiles document.
    #[must_use]
    pub fn profiles_file(&self) -> PathBuf {
        self.config_dir.join(PROFILES_FILE)
    }

    /// Parameter layout document.
    #[must_use]
    pub fn layout_file(&self) -> PathBuf {
        self.config_dir.join(LAYOUT_FILE)
    }

    /// Theme document.
    #[must_use]
    pub fn theme_file(&self) -> PathBuf {
        self.config_dir.join(THEME_FILE)
    }

    /// Loads the settings store.
    #[must_use]
    pub fn settings(&self) -> SettingsStore {
        SettingsStore::load(self.settings_file())
    }

    /// Loads the profile store.
    #[must_use]
    pub fn profiles(&self) -> ProfileStore {
        ProfileStore::load(self.profiles_file())
    }

    /// Loads the layout store.
    #[must_use]
    pub fn layout(&self) -> LayoutStore {
        LayoutStore::load(self.layout_file())
    }

    /// Loads the theme store.
    #[must_use]
    pub fn theme(&self) -> ThemeStore {
        ThemeStore::load(self.theme_file())
    }
}

/// Directories resolved from one snapshot of the settings.
///
/// Changing settings means building a new context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    server_dir: PathBuf,
    models_dir: PathBuf,
    executable: PathBuf,
}

impl AppContext {
    /// Resolves directories, applying the defaults for unset settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let server_dir = settings.resolved_server_dir();
        let models_dir = settings.resolved_models_dir();
        let executable = server_dir.join(SERVER_EXECUTABLE);
        Self {
            server_dir,
            models_dir,
            executable,
        }
    }

    /// Directory containing llama-server; also the server's working directory.
    #[must_use]
    pub fn server_dir(&self) -> &Path {
        &self.server_dir
    }

    /// Root of the model tree.
    #[must_use]
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Full path of the server executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Scanner over the models directory.
    #[must_use]
    pub fn scanner(&self) -> ModelScanner {
        ModelScanner::new(&self.models_dir)
    }

    /// Command builder for this server and models directory.
    #[must_use]
    pub fn command_builder(&self) -> CommandBuilder {
        CommandBuilder::new(&self.executable, &self.models_dir)
    }
}
