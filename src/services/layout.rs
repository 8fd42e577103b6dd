//! Parameter layout persistence.
//!
//! The layout is the ordered list of form fields. A missing or unreadable
//! layout document means the built-in list is used.

use crate::constants::{DEFAULT_FIT_TARGET_MIB, DEFAULT_PORT};
use crate::models::{keys, ParamKind, ParameterDefinition};
use crate::services::store::{read_json, write_json};
use anyhow::Result;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// KV cache types accepted by `-ctk` / `-ctv`; empty means "server default".
const CACHE_TYPES: &[&str] = &[
    "", "f16", "bf16", "q8_0", "q4_0", "q4_1", "iq4_nl", "q5_0", "q5_1", "f32",
];

fn choice(options: &[&str]) -> ParamKind {
    ParamKind::Choice(options.iter().map(|o| (*o).to_string()).collect())
}

/// The built-in form, in display order.
#[must_use]
pub fn builtin_definitions() -> Vec<ParameterDefinition> {
    use ParamKind::{Boolean, Float, Integer, Text};

    vec![
        ParameterDefinition::new("Model", keys::MODEL, ParamKind::Choice(Vec::new()), ""),
        ParameterDefinition::new(
            "Multimodal Projector (mmproj)",
            keys::MMPROJ,
            ParamKind::Choice(Vec::new()),
            "",
        ),
        ParameterDefinition::new("Port", keys::PORT, Integer, DEFAULT_PORT),
        ParameterDefinition::new("Context Size", "ctx-size", Integer, 32000),
        ParameterDefinition::new("GPU Layers (-ngl)", keys::GPU_LAYERS, Integer, 999),
        ParameterDefinition::new("Batch Size (-ub)", "ub", Integer, 512),
        ParameterDefinition::new(
            "Offload Mode",
            keys::OFFLOAD_MODE,
            choice(&["manual", "fit"]),
            "manual",
        ),
        ParameterDefinition::new("CPU MoE Layers", keys::N_CPU_MOE, Integer, 0),
        ParameterDefinition::new(
            "Fit Target (MiB buffer)",
            keys::FIT_TARGET,
            Integer,
            DEFAULT_FIT_TARGET_MIB,
        ),
        ParameterDefinition::new("Temperature", "temp", Float, 0.7),
        ParameterDefinition::new("Top P", "top-p", Float, 0.8),
        ParameterDefinition::new("Min P", "min-p", Float, 0.0),
        ParameterDefinition::new("Top K", "top-k", Integer, 20),
        ParameterDefinition::new("Repeat Penalty", "repeat-penalty", Float, 1.05),
        ParameterDefinition::new("Main GPU", keys::MAIN_GPU, Integer, 0),
        ParameterDefinition::new(
            "Split Mode",
            keys::SPLIT_MODE,
            choice(&["none", "layer", "row"]),
            "none",
        ),
        ParameterDefinition::new("Tensor Split (-ts)", keys::TENSOR_SPLIT, Text, ""),
        ParameterDefinition::new("Flash Attention", keys::FLASH_ATTN, Boolean, true),
        ParameterDefinition::new("Expose to Network (0.0.0.0)", keys::HOST_ALL, Boolean, false),
        ParameterDefinition::new("Jinja Template", keys::JINJA, Boolean, true),
        ParameterDefinition::new(
            "Reasoning Format",
            "reasoning-format",
            choice(&["auto", "none", "deepseek", "deepseek-legacy"]),
            "auto",
        ),
        ParameterDefinition::new(
            "Reasoning Effort",
            keys::REASONING_EFFORT,
            choice(&["", "low", "medium", "high"]),
            "",
        ),
        ParameterDefinition::new("Cache Type K (-ctk)", "ctk", choice(CACHE_TYPES), ""),
        ParameterDefinition::new("Cache Type V (-ctv)", "ctv", choice(CACHE_TYPES), ""),
    ]
}

/// Form layout bound to its document on disk.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
    definitions: Vec<ParameterDefinition>,
}

impl LayoutStore {
    /// Loads the layout, falling back to [`builtin_definitions`].
    ///
    /// Entries that fail to parse are skipped; for duplicate keys the first
    /// occurrence wins.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let definitions = match read_json::<Vec<Value>>(&path) {
            Some(entries) => parse_entries(&path, entries),
            None => builtin_definitions(),
        };
        Self { path, definitions }
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Definitions in display order.
    #[must_use]
    pub fn definitions(&self) -> &[ParameterDefinition] {
        &self.definitions
    }

    /// Looks up a definition by key.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&ParameterDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    /// Appends a definition.
    ///
    /// # Errors
    ///
    /// Fails when the key is empty or already used, or when the document
    /// cannot be written.
    pub fn add(&mut self, definition: ParameterDefinition) -> Result<()> {
        if definition.key.trim().is_empty() {
            anyhow::bail!("Parameter key cannot be empty");
        }
        if self.find(&definition.key).is_some() {
            anyhow::bail!("Parameter '{}' already exists", definition.key);
        }
        self.definitions.push(definition);
        self.try_save()
    }

    /// Replaces the definition with the same key, keeping its position.
    pub fn replace(&mut self, definition: ParameterDefinition) -> Result<()> {
        let slot = self
            .definitions
            .iter_mut()
            .find(|d| d.key == definition.key)
            .ok_or_else(|| anyhow::anyhow!("Parameter '{}' not found", definition.key))?;
        *slot = definition;
        self.try_save()
    }

    /// Removes a definition, returning it.
    pub fn remove(&mut self, key: &str) -> Result<ParameterDefinition> {
        let index = self.index_of(key)?;
        let removed = self.definitions.remove(index);
        self.try_save()?;
        Ok(removed)
    }

    /// Moves a definition to `index` (clamped to the end of the list).
    pub fn move_to(&mut self, key: &str, index: usize) -> Result<()> {
        let from = self.index_of(key)?;
        let definition = self.definitions.remove(from);
        let to = index.min(self.definitions.len());
        self.definitions.insert(to, definition);
        self.try_save()
    }

    /// Restores the built-in layout and writes it.
    pub fn reset(&mut self) -> Result<()> {
        self.definitions = builtin_definitions();
        self.try_save()
    }

    /// Writes the document, logging failures.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Failed to save parameter layout: {e:#}");
        }
    }

    /// Writes the document.
    pub fn try_save(&self) -> Result<()> {
        write_json(&self.path, &self.definitions)
    }

    fn index_of(&self, key: &str) -> Result<usize> {
        self.definitions
            .iter()
            .position(|d| d.key == key)
            .ok_or_else(|| anyhow::anyhow!("Parameter '{key}' not found"))
    }
}

fn parse_entries(path: &Path, entries: Vec<Value>) -> Vec<ParameterDefinition> {
    let mut seen = HashSet::new();
    let mut definitions = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let key_hint = entry.get("key").cloned().unwrap_or_else(|| json!(index));
        match serde_json::from_value::<ParameterDefinition>(entry) {
            Ok(definition) => {
                if seen.insert(definition.key.clone()) {
                    definitions.push(definition);
                } else {
                    warn!(
                        "Duplicate parameter key '{}' in {}; keeping the first",
                        definition.key,
                        path.display()
                    );
                }
            }
            Err(e) => warn!(
                "Skipping parameter {key_hint} in {}: {e}",
                path.display()
            ),
        }
    }

    definitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::WriteFailed;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_keys_are_unique() {
        let definitions = builtin_definitions();
        let keys: HashSet<_> = definitions.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys.len(), definitions.len());
        assert_eq!(definitions[0].key, keys::MODEL);
    }

    #[test]
    fn test_missing_file_loads_builtins() {
        let temp = TempDir::new().unwrap();
        let store = LayoutStore::load(temp.path().join("gui_layout.json"));
        assert_eq!(store.definitions(), builtin_definitions().as_slice());
    }

    #[test]
    fn test_legacy_layout_loads() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gui_layout.json");
        fs::write(
            &path,
            r#"[
                {"label": "Model", "key": "model", "type": "combo", "default": [], "options": []},
                {"label": "Port", "key": "port", "type": "int", "default": 8080},
                {"label": "Again", "key": "port", "type": "int", "default": 1},
                {"label": "Broken", "key": "x", "type": "slider"}
            ]"#,
        )
        .unwrap();

        let store = LayoutStore::load(&path);
        let keys: Vec<_> = store.definitions().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["model", "port"]);
        assert_eq!(store.find("port").unwrap().default, json!(8080));
        assert_eq!(store.find("model").unwrap().default, json!(""));
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let temp = TempDir::new().unwrap();
        let mut store = LayoutStore::load(temp.path().join("gui_layout.json"));
        let duplicate = ParameterDefinition::new("Port again", keys::PORT, ParamKind::Integer, 1);
        assert!(store.add(duplicate).is_err());
        let empty = ParameterDefinition::new("Nothing", " ", ParamKind::Text, "");
        assert!(store.add(empty).is_err());
    }

    #[test]
    fn test_mutations_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gui_layout.json");
        let mut store = LayoutStore::load(&path);

        store
            .add(ParameterDefinition::new("Seed", "seed", ParamKind::Integer, -1))
            .unwrap();
        store.move_to("seed", 0).unwrap();
        store.remove("ts").unwrap();
        store
            .replace(ParameterDefinition::new("Port", keys::PORT, ParamKind::Integer, 9000))
            .unwrap();

        let mut reloaded = LayoutStore::load(&path);
        assert_eq!(reloaded.definitions()[0].key, "seed");
        assert!(reloaded.find("ts").is_none());
        assert_eq!(reloaded.find(keys::PORT).unwrap().default, json!(9000));
        assert!(reloaded.remove("does-not-exist").is_err());
    }

    #[test]
    fn test_move_clamps_index() {
        let temp = TempDir::new().unwrap();
        let mut store = LayoutStore::load(temp.path().join("gui_layout.json"));
        store.move_to(keys::MODEL, 999).unwrap();
        assert_eq!(store.definitions().last().unwrap().key, keys::MODEL);
    }

    #[test]
    fn test_reset_restores_builtins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gui_layout.json");
        let mut store = LayoutStore::load(&path);
        store.remove(keys::PORT).unwrap();
        store.reset().unwrap();
        assert!(LayoutStore::load(&path).find(keys::PORT).is_some());
    }

    #[test]
    fn test_failed_write_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gui_layout.json");
        fs::create_dir(&path).unwrap();
        let mut store = LayoutStore::load(&path);

        let err = store.move_to(keys::MODEL, 1).unwrap_err();
        assert!(err.downcast_ref::<WriteFailed>().is_some());
        assert!(store.reset().is_err());
    }
}
