//! Data models for launch parameters and profiles.
//!
//! This module contains the core data structures shared by the stores, the
//! command builder, and the command-line front end.
//! Models are designed to be independent of UI and persistence.

pub mod parameter;
pub mod profile;

// Re-export all model types
pub use parameter::{keys, ParamKind, ParameterDefinition, ParameterValues};
pub use profile::Profile;
