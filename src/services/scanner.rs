//! Model file discovery.
//!
//! Walks the models directory for `.gguf` files and associates every model
//! with the multimodal projector files found next to it. Each scan is a full
//! re-scan returning an immutable [`ScanResult`], so a caller holding an older
//! result never sees associations from a newer scan.

use crate::constants::{MODEL_EXTENSION, PROJECTOR_MARKERS};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scanner rooted at a models directory.
#[derive(Debug, Clone)]
pub struct ModelScanner {
    root: PathBuf,
}

impl ModelScanner {
    /// Creates a scanner for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Models directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scans the models directory.
    ///
    /// A missing root yields an empty result. Symlinked directories are not
    /// followed; unreadable directories are skipped with a warning.
    #[must_use]
    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult {
            root: self.root.clone(),
            ..ScanResult::default()
        };

        if !self.root.is_dir() {
            debug!("Models directory {} does not exist", self.root.display());
            return result;
        }

        visit_directory(&self.root, "", &mut result);
        result
            .models
            .sort_by_cached_key(|path| (path.matches('/').count(), path.to_lowercase()));

        debug!(
            "Found {} models under {}",
            result.models.len(),
            self.root.display()
        );
        result
    }
}

/// Models found by one scan, with their companion projectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    root: PathBuf,
    models: Vec<String>,
    companions: BTreeMap<String, Vec<String>>,
}

impl ScanResult {
    /// Directory that was scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Model paths relative to the root, `/`-separated, sorted by depth then name.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Projector files in the same directory as `model`.
    ///
    /// Empty for models without projectors and for unknown models.
    #[must_use]
    pub fn companions(&self, model: &str) -> &[String] {
        self.companions
            .get(model)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns true when `model` was found by this scan.
    #[must_use]
    pub fn contains(&self, model: &str) -> bool {
        self.companions.contains_key(model)
    }

    /// Number of models found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true when no model was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Absolute path of a model or projector given its relative path.
    #[must_use]
    pub fn full_path(&self, relative: &str) -> PathBuf {
        resolve_relative(&self.root, relative)
    }
}

/// Joins a `/`-separated relative path onto `root` using host separators.
#[must_use]
pub fn resolve_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Returns true when `file_name` marks a multimodal projector.
#[must_use]
pub fn is_projector(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    PROJECTOR_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn has_model_extension(file_name: &str) -> bool {
    file_name
        .to_lowercase()
        .ends_with(&format!(".{MODEL_EXTENSION}"))
}

fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn visit_directory(dir: &Path, relative_dir: &str, result: &mut ScanResult) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable directory {}: {e}", dir.display());
            return;
        }
    };

    let mut subdirectories = Vec::new();
    let mut models = Vec::new();
    let mut projectors = Vec::new();

    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            debug!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            subdirectories.push((entry.path(), join_relative(relative_dir, &name)));
        } else if entry.path().is_file() && has_model_extension(&name) {
            let relative = join_relative(relative_dir, &name);
            if is_projector(&name) {
                projectors.push(relative);
            } else {
                models.push(relative);
            }
        }
    }

    projectors.sort_by_cached_key(|path| path.to_lowercase());
    for model in models {
        result.companions.insert(model.clone(), projectors.clone());
        result.models.push(model);
    }

    for (path, relative) in subdirectories {
        visit_directory(&path, &relative, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = resolve_relative(root, relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"GGUF").unwrap();
    }

    #[test]
    fn test_model_and_companion_in_same_directory() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a/model.gguf");
        touch(temp.path(), "a/model-mmproj.gguf");

        let result = ModelScanner::new(temp.path()).scan();
        assert_eq!(result.models(), ["a/model.gguf".to_string()]);
        assert_eq!(
            result.companions("a/model.gguf"),
            ["a/model-mmproj.gguf".to_string()]
        );
    }

    #[test]
    fn test_sorted_by_depth_then_name() {
        let temp = TempDir::new().unwrap();
        for path in ["top.gguf", "B/x.gguf", "a/y.gguf", "a/deep/z.gguf", "Alpha.gguf"] {
            touch(temp.path(), path);
        }

        let result = ModelScanner::new(temp.path()).scan();
        assert_eq!(
            result.models(),
            ["Alpha.gguf", "top.gguf", "a/y.gguf", "B/x.gguf", "a/deep/z.gguf"]
                .map(String::from)
        );
    }

    #[test]
    fn test_model_without_companions_maps_to_empty() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "solo.gguf");
        touch(temp.path(), "other/mmproj-f16.gguf");

        let result = ModelScanner::new(temp.path()).scan();
        assert!(result.contains("solo.gguf"));
        assert!(result.companions("solo.gguf").is_empty());
        // A projector-only directory contributes no models
        assert_eq!(result.len(), 1);
        assert!(result.companions("unknown.gguf").is_empty());
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "v/Vision.GGUF");
        touch(temp.path(), "v/Vision-MMPROJ-F16.gguf");
        touch(temp.path(), "v/readme.txt");

        let result = ModelScanner::new(temp.path()).scan();
        assert_eq!(result.models(), ["v/Vision.GGUF".to_string()]);
        assert_eq!(
            result.companions("v/Vision.GGUF"),
            ["v/Vision-MMPROJ-F16.gguf".to_string()]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let result = ModelScanner::new(temp.path().join("nope")).scan();
        assert!(result.is_empty());
        assert!(result.companions("a/model.gguf").is_empty());
    }

    #[test]
    fn test_rescan_reflects_removed_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a/model.gguf");
        touch(temp.path(), "a/model-mmproj.gguf");
        let scanner = ModelScanner::new(temp.path());
        let first = scanner.scan();

        fs::remove_file(temp.path().join("a").join("model-mmproj.gguf")).unwrap();
        let second = scanner.scan();

        // The older result is unaffected by the newer scan
        assert_eq!(first.companions("a/model.gguf").len(), 1);
        assert!(second.companions("a/model.gguf").is_empty());
    }

    #[test]
    fn test_full_path_uses_host_separators() {
        let root = Path::new("models");
        let expected: PathBuf = ["models", "sub", "m.gguf"].iter().collect();
        assert_eq!(resolve_relative(root, "sub/m.gguf"), expected);
        assert_eq!(resolve_relative(root, ""), PathBuf::from("models"));
    }
}
