//! Process-wide settings: where the server lives and where models are kept.

use crate::constants::DEFAULT_MODELS_DIR_NAME;
use crate::services::store::{read_json, write_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::error;

/// Settings document.
///
/// Unknown keys are kept in `extra` so a rewrite never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory containing the llama-server executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_dir: Option<PathBuf>,
    /// Root directory scanned for model files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_dir: Option<PathBuf>,
    /// Keys this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Settings {
    /// Server directory, defaulting to the directory holding this binary.
    #[must_use]
    pub fn resolved_server_dir(&self) -> PathBuf {
        self.server_dir.clone().unwrap_or_else(default_server_dir)
    }

    /// Models directory, defaulting to `<server dir>/models`.
    #[must_use]
    pub fn resolved_models_dir(&self) -> PathBuf {
        self.models_dir
            .clone()
            .unwrap_or_else(|| self.resolved_server_dir().join(DEFAULT_MODELS_DIR_NAME))
    }
}

fn default_server_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Settings bound to their document on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Loads settings from `path`, falling back to empty settings.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = read_json(&path).unwrap_or_default();
        Self { path, settings }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sets the server directory and writes the document.
    pub fn set_server_dir(&mut self, dir: PathBuf) {
        self.settings.server_dir = Some(dir);
        self.save();
    }

    /// Sets the models directory and writes the document.
    pub fn set_models_dir(&mut self, dir: PathBuf) {
        self.settings.models_dir = Some(dir);
        self.save();
    }

    /// Applies `change` and writes the document, reporting write failures.
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) -> Result<()> {
        change(&mut self.settings);
        self.try_save()
    }

    /// Writes the document, logging failures.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Failed to save settings: {e:#}");
        }
    }

    /// Writes the document.
    pub fn try_save(&self) -> Result<()> {
        write_json(&self.path, &self.settings)
    }
}
