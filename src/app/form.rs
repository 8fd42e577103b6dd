//! Launch form assembly.
//!
//! The form state is layered: layout defaults, then the selected profile, then
//! explicit overrides. A command line front end fills the overrides from
//! `--model`, `--mmproj`, and repeated `--set KEY=VALUE` arguments.

use crate::models::{keys, ParameterDefinition, ParameterValues, Profile};
use crate::services::ScanResult;
use anyhow::Result;
use tracing::{debug, warn};

/// Values given explicitly for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormOverrides {
    /// Model relative path
    pub model: Option<String>,
    /// Projector relative path; an empty string clears it
    pub mmproj: Option<String>,
    /// `KEY=VALUE` assignments, applied in order
    pub assignments: Vec<String>,
}

/// Current values of the launch form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: ParameterValues,
}

impl FormState {
    /// Layers defaults, `profile`, and `overrides`.
    ///
    /// Fails when an assignment names an unknown key or carries a value its
    /// definition rejects.
    pub fn assemble(
        definitions: &[ParameterDefinition],
        profile: Option<&Profile>,
        overrides: &FormOverrides,
    ) -> Result<Self> {
        let mut values = ParameterValues::from_defaults(definitions);

        if let Some(profile) = profile {
            debug!("Applying profile '{}'", profile.name);
            values.overlay(&profile.parameters);
        }

        if let Some(model) = &overrides.model {
            values.set(keys::MODEL, model.as_str());
        }
        if let Some(projector) = &overrides.mmproj {
            values.set(keys::MMPROJ, projector.as_str());
        }

        for assignment in &overrides.assignments {
            values.apply_assignment(definitions, assignment)?;
        }

        Ok(Self { values })
    }

    /// Current values.
    #[must_use]
    pub fn values(&self) -> &ParameterValues {
        &self.values
    }

    /// Consumes the form, returning its values.
    #[must_use]
    pub fn into_values(self) -> ParameterValues {
        self.values
    }

    /// Selected model, if any.
    #[must_use]
    pub fn model(&self) -> Option<String> {
        self.values.text(keys::MODEL)
    }

    /// Selected projector, if any.
    #[must_use]
    pub fn mmproj(&self) -> Option<String> {
        self.values.text(keys::MMPROJ)
    }

    /// Restricts the projector to the companions of the selected model.
    ///
    /// Returns the projector that was cleared, if any.
    pub fn reconcile(&mut self, scan: &ScanResult) -> Option<String> {
        let projector = self.mmproj()?;
        let model = self.model();

        if let Some(model) = &model {
            if !scan.contains(model) {
                warn!("Model '{model}' was not found under {}", scan.root().display());
            }
        }

        let allowed = model
            .as_deref()
            .is_some_and(|model| scan.companions(model).contains(&projector));
        if allowed {
            return None;
        }

        warn!(
            "Projector '{projector}' does not belong to model '{}'; clearing it",
            model.as_deref().unwrap_or_default()
        );
        self.values.set(keys::MMPROJ, "");
        Some(projector)
    }

    /// Checks the form can be launched.
    pub fn validate_launch(&self) -> Result<()> {
        if self.model().is_none() {
            anyhow::bail!("No model selected (use --model or a profile with a model)");
        }
        Ok(())
    }
}
