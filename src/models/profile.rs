//! Named launch profiles.

use crate::models::ParameterValues;
use serde::{Deserialize, Serialize};

/// A named snapshot of every form value.
///
/// # Validation
///
/// - Name must be non-empty after trimming
/// - Name must be unique within the profiles document (enforced by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique profile name
    pub name: String,
    /// Saved form values
    #[serde(default)]
    pub parameters: ParameterValues,
}

impl Profile {
    /// Creates a profile from a name and a values snapshot.
    pub fn new(name: impl Into<String>, parameters: ParameterValues) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Validates a profile name, returning the trimmed form.
    pub fn validate_name(name: &str) -> anyhow::Result<&str> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            anyhow::bail!("Profile name cannot be empty");
        }
        Ok(trimmed)
    }
}
