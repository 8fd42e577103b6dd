//! Shared JSON document I/O for the persistence stores.
//!
//! Reads never fail the caller: a missing, unreadable, or malformed document
//! yields `None` and the store substitutes its default. Writes go through a
//! temp file + rename so a crash never leaves a half-written document.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Context attached to every [`write_json`] failure.
///
/// Lets callers tell a failed write apart from a rejected edit with
/// `anyhow::Error::downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailed {
    /// Document that could not be written
    pub path: PathBuf,
}

impl fmt::Display for WriteFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to save {}", self.path.display())
    }
}

/// Indentation used for every document on disk.
const INDENT: &[u8] = b"    ";

/// Reads and parses a JSON document.
///
/// Returns `None` when the file does not exist, cannot be read, or does not
/// parse as `T`. Every failure except a missing file is logged.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist yet, using defaults", path.display());
            return None;
        }
        Err(e) => {
            warn!("Failed to read {}: {e}; using defaults", path.display());
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!("Failed to parse {}: {e}; using defaults", path.display());
            None
        }
    }
}

/// Serializes `document` as pretty JSON and atomically replaces `path`.
///
/// Errors carry a [`WriteFailed`] context.
pub fn write_json<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    write_document(path, document).context(WriteFailed {
        path: path.to_path_buf(),
    })
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    buffer.push(b'\n');

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &buffer)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    // Atomic rename
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let result: Option<Value> = read_json(&temp.path().join("missing.json"));
        assert!(result.is_none());
    }

    #[test]
    fn test_read_malformed_file_is_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let result: Option<Value> = read_json(&path);
        assert!(result.is_none());
    }

    #[test]
    fn test_write_creates_parent_and_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("doc.json");
        write_json(&path, &json!({"a": [1, 2]})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("    \"a\""), "expected 4-space indent: {content}");
        assert!(!path.with_extension("json.tmp").exists());

        let back: Value = read_json(&path).unwrap();
        assert_eq!(back, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_write_failure_is_tagged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.json");
        fs::create_dir(&path).unwrap();

        let err = write_json(&path, &json!({})).unwrap_err();
        assert_eq!(
            err.downcast_ref::<WriteFailed>(),
            Some(&WriteFailed { path: path.clone() })
        );
    }
}
