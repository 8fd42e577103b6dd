//! Profile persistence.
//!
//! All profiles live in one document keyed by name. Every mutation rewrites
//! the whole file; there is a single desktop user, so no merge with concurrent
//! writers is attempted.

use crate::models::{ParameterValues, Profile};
use crate::services::store::{read_json, write_json};
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Profiles bound to their document on disk.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Loads the profiles document, falling back to no profiles.
    ///
    /// Entries that are not objects are skipped with a warning instead of
    /// discarding the whole document.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document: Map<String, Value> = read_json(&path).unwrap_or_default();

        let mut profiles = BTreeMap::new();
        for (name, entry) in document {
            match profile_from_entry(&name, entry) {
                Some(profile) => {
                    profiles.insert(name, profile);
                }
                None => warn!("Skipping malformed profile '{name}' in {}", path.display()),
            }
        }

        Self { path, profiles }
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Returns true when a profile with `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Number of stored profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns true when no profile is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Creates a new profile.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty or already taken, or when the document
    /// cannot be written.
    pub fn create(&mut self, name: &str, parameters: ParameterValues) -> Result<()> {
        let name = Profile::validate_name(name)?;
        if self.profiles.contains_key(name) {
            anyhow::bail!("Profile '{name}' already exists");
        }
        self.insert(name, parameters)
    }

    /// Creates or overwrites a profile.
    pub fn upsert(&mut self, name: &str, parameters: ParameterValues) -> Result<()> {
        let name = Profile::validate_name(name)?;
        self.insert(name, parameters)
    }

    /// Deletes a profile. Returns false when it did not exist.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        if self.profiles.remove(name).is_none() {
            return Ok(false);
        }
        self.try_save()?;
        Ok(true)
    }

    /// Deletes every profile, returning how many were removed.
    pub fn delete_all(&mut self) -> Result<usize> {
        let count = self.profiles.len();
        self.profiles.clear();
        self.try_save()?;
        Ok(count)
    }

    /// Writes the document, logging failures.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Failed to save profiles: {e:#}");
        }
    }

    /// Writes the document.
    pub fn try_save(&self) -> Result<()> {
        write_json(&self.path, &self.profiles)
    }

    fn insert(&mut self, name: &str, parameters: ParameterValues) -> Result<()> {
        self.profiles
            .insert(name.to_string(), Profile::new(name, parameters));
        self.try_save()
    }
}

/// Converts one document entry into a profile.
///
/// Besides the `{name, parameters}` shape, a flat object of values (written by
/// early versions) is accepted as the parameters themselves.
fn profile_from_entry(name: &str, entry: Value) -> Option<Profile> {
    let Value::Object(mut fields) = entry else {
        return None;
    };

    let parameters = match fields.remove("parameters") {
        Some(Value::Object(parameters)) => parameters.into_iter().collect(),
        Some(_) => return None,
        None if fields.contains_key("name") => ParameterValues::new(),
        None => fields.into_iter().collect(),
    };

    Some(Profile::new(name, parameters))
}
