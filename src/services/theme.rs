//! Theme document persistence.
//!
//! The theme is a nested document of `colors`, `fonts`, and `sizes`. Loading
//! merges the saved document over the built-in defaults, so keys introduced
//! after a theme was saved are backfilled without a resave.

use crate::services::store::{read_json, write_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, warn};

const DEFAULT_COLORS: &[(&str, &str)] = &[
    ("window_bg", "#1e1e2e"),
    ("text", "#cdd6f4"),
    ("label_text", "#bac2de"),
    ("input_bg", "#313244"),
    ("input_border", "#45475a"),
    ("input_border_focus", "#89b4fa"),
    ("button_bg", "#89b4fa"),
    ("button_text", "#1e1e2e"),
    ("button_hover", "#74c7ec"),
    ("button_pressed", "#585b70"),
    ("stop_btn_bg", "#f38ba8"),
    ("stop_btn_hover", "#eba0ac"),
    ("stop_btn_pressed", "#a6294a"),
    ("list_bg", "#313244"),
    ("list_item_selected", "#45475a"),
];

const DEFAULT_FONTS: &[(&str, &str)] = &[("family", "Segoe UI"), ("size", "14px")];

const DEFAULT_SIZES: &[(&str, &str)] = &[
    ("border_radius", "4px"),
    ("input_padding", "5px"),
    ("btn_padding", "8px 16px"),
];

/// Section of the theme document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSection {
    /// Named colors (hex strings)
    Colors,
    /// Font family and size
    Fonts,
    /// Spacing and radii
    Sizes,
}

impl ThemeSection {
    /// All sections in document order.
    pub const ALL: [Self; 3] = [Self::Colors, Self::Fonts, Self::Sizes];

    /// Key of the section in the document.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colors => "colors",
            Self::Fonts => "fonts",
            Self::Sizes => "sizes",
        }
    }
}

impl fmt::Display for ThemeSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeSection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "colors" => Ok(Self::Colors),
            "fonts" => Ok(Self::Fonts),
            "sizes" => Ok(Self::Sizes),
            other => anyhow::bail!(
                "Unknown theme section '{other}' (expected colors, fonts, or sizes)"
            ),
        }
    }
}

/// In-memory theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeDocument {
    /// Named colors
    pub colors: BTreeMap<String, String>,
    /// Font settings
    pub fonts: BTreeMap<String, String>,
    /// Size settings
    pub sizes: BTreeMap<String, String>,
    /// Sections this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ThemeDocument {
    fn default() -> Self {
        let section = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        };
        Self {
            colors: section(DEFAULT_COLORS),
            fonts: section(DEFAULT_FONTS),
            sizes: section(DEFAULT_SIZES),
            extra: BTreeMap::new(),
        }
    }
}

impl ThemeDocument {
    /// Looks up one entry.
    #[must_use]
    pub fn get(&self, section: ThemeSection, name: &str) -> Option<&str> {
        self.section(section).get(name).map(String::as_str)
    }

    /// Entries of one section.
    #[must_use]
    pub fn section(&self, section: ThemeSection) -> &BTreeMap<String, String> {
        match section {
            ThemeSection::Colors => &self.colors,
            ThemeSection::Fonts => &self.fonts,
            ThemeSection::Sizes => &self.sizes,
        }
    }

    fn section_mut(&mut self, section: ThemeSection) -> &mut BTreeMap<String, String> {
        match section {
            ThemeSection::Colors => &mut self.colors,
            ThemeSection::Fonts => &mut self.fonts,
            ThemeSection::Sizes => &mut self.sizes,
        }
    }

    /// JSON form of the document.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let section = |entries: &BTreeMap<String, String>| {
            Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )
        };

        let mut document: Map<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        document.insert("colors".to_string(), section(&self.colors));
        document.insert("fonts".to_string(), section(&self.fonts));
        document.insert("sizes".to_string(), section(&self.sizes));
        Value::Object(document)
    }
}

/// Recursively merges `source` into `target`.
///
/// Nested objects present on both sides are merged key by key; any other
/// value in `source` replaces the one in `target`. Keys only in `target`
/// are kept.
pub fn merge_defaults(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                let nested =
                    value.is_object() && target_map.get(&key).is_some_and(Value::is_object);
                match target_map.get_mut(&key) {
                    Some(existing) if nested => merge_defaults(existing, value),
                    _ => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Theme bound to its document on disk.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
    theme: ThemeDocument,
}

impl ThemeStore {
    /// Loads the theme, merging the saved document over the defaults.
    ///
    /// A document that is not an object, or whose merged form is not a valid
    /// theme (e.g. a color that is not a string), is replaced by the defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = match read_json::<Value>(&path) {
            Some(saved @ Value::Object(_)) => {
                let mut merged = ThemeDocument::default().to_value();
                merge_defaults(&mut merged, saved);
                serde_json::from_value(merged).unwrap_or_else(|e| {
                    warn!("Invalid theme in {}: {e}; using defaults", path.display());
                    ThemeDocument::default()
                })
            }
            Some(_) => {
                warn!("Theme in {} is not an object; using defaults", path.display());
                ThemeDocument::default()
            }
            None => ThemeDocument::default(),
        };
        Self { path, theme }
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current theme.
    #[must_use]
    pub fn theme(&self) -> &ThemeDocument {
        &self.theme
    }

    /// Sets one entry and writes the document.
    pub fn set(&mut self, section: ThemeSection, name: &str, value: &str) -> Result<()> {
        self.theme
            .section_mut(section)
            .insert(name.to_string(), value.to_string());
        self.try_save()
    }

    /// Restores the default theme and writes it.
    pub fn reset(&mut self) -> Result<()> {
        self.theme = ThemeDocument::default();
        self.try_save()
    }

    /// Writes the document, logging failures.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Failed to save theme: {e:#}");
        }
    }

    /// Writes the document.
    pub fn try_save(&self) -> Result<()> {
        write_json(&self.path, &self.theme.to_value())
    }
}
