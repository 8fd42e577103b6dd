//! Parameter definitions and parameter values.
//!
//! A [`ParameterDefinition`] describes one form field; the ordered list of
//! definitions drives the launch form. [`ParameterValues`] is the mapping the
//! form produces and the command builder consumes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Well-known parameter keys with special meaning to the command builder.
pub mod keys {
    /// Relative path of the model file
    pub const MODEL: &str = "model";
    /// Relative path of the multimodal projector file
    pub const MMPROJ: &str = "mmproj";
    /// Server port
    pub const PORT: &str = "port";
    /// Chat template formatting toggle
    pub const JINJA: &str = "jinja";
    /// Bind to all interfaces instead of loopback
    pub const HOST_ALL: &str = "host_0000";
    /// Flash attention mode
    pub const FLASH_ATTN: &str = "flash-attn";
    /// Offload mode discriminator ("fit" or manual)
    pub const OFFLOAD_MODE: &str = "offload-mode";
    /// Free VRAM target for automatic fitting
    pub const FIT_TARGET: &str = "fit-target";
    /// MoE layers kept on the CPU in manual mode
    pub const N_CPU_MOE: &str = "n-cpu-moe";
    /// GPU layer count
    pub const GPU_LAYERS: &str = "ngl";
    /// Multi-GPU split mode
    pub const SPLIT_MODE: &str = "split-mode";
    /// Main GPU index
    pub const MAIN_GPU: &str = "main-gpu";
    /// Tensor split proportions
    pub const TENSOR_SPLIT: &str = "ts";
    /// Reasoning effort forwarded through the environment
    pub const REASONING_EFFORT: &str = "reasoning-effort";
}

/// Value type of a form field.
///
/// Each variant owns its parsing and rendering so callers never branch on a
/// type tag themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Free text
    Text,
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
    /// On/off toggle
    Boolean,
    /// One of a fixed set of options.
    ///
    /// An empty option list means the options are supplied at runtime
    /// (model and projector pickers), so any value is accepted.
    Choice(Vec<String>),
}

impl ParamKind {
    /// Builds a kind from its stored type tag and option list.
    ///
    /// `combo` is accepted as an alias of `choice` for layouts written by
    /// older versions.
    pub fn from_parts(type_name: &str, options: Option<Vec<String>>) -> Result<Self> {
        match type_name.trim().to_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "int" | "integer" => Ok(Self::Integer),
            "float" | "number" => Ok(Self::Float),
            "bool" | "boolean" => Ok(Self::Boolean),
            "choice" | "combo" => Ok(Self::Choice(options.unwrap_or_default())),
            other => anyhow::bail!(
                "Unknown parameter type '{other}' (expected text, int, float, bool, or choice)"
            ),
        }
    }

    /// Type tag written to the layout document.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Boolean => "bool",
            Self::Choice(_) => "choice",
        }
    }

    /// Allowed options for choice parameters.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Choice(options) => Some(options),
            _ => None,
        }
    }

    /// Parses user input into a value of this kind.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        match self {
            Self::Text => Ok(Value::String(raw.to_string())),
            Self::Integer => {
                let parsed: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("'{raw}' is not an integer"))?;
                Ok(Value::from(parsed))
            }
            Self::Float => {
                let parsed: f64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("'{raw}' is not a number"))?;
                Number::from_f64(parsed)
                    .map(Value::Number)
                    .with_context(|| format!("'{raw}' is not a finite number"))
            }
            Self::Boolean => parse_bool(raw)
                .map(Value::Bool)
                .with_context(|| format!("'{raw}' is not a boolean (use true or false)")),
            Self::Choice(options) => {
                if options.is_empty() || options.iter().any(|option| option == raw) {
                    Ok(Value::String(raw.to_string()))
                } else {
                    anyhow::bail!(
                        "'{raw}' is not one of the allowed options: {}",
                        display_options(options)
                    )
                }
            }
        }
    }

    /// Renders a value for display.
    #[must_use]
    pub fn render(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (Self::Boolean, value) => match value_as_bool(value) {
                Some(true) => "on".to_string(),
                Some(false) => "off".to_string(),
                None => value_to_text(value),
            },
            (_, value) => value_to_text(value),
        }
    }

    /// Normalizes a loosely typed stored value into this kind's JSON type.
    ///
    /// Unconvertible values fall back to the kind's zero value.
    #[must_use]
    pub fn coerce(&self, value: Value) -> Value {
        match self {
            Self::Text => match value {
                Value::Null | Value::Array(_) | Value::Object(_) => Value::String(String::new()),
                other => Value::String(value_to_text(&other)),
            },
            Self::Integer => Value::from(value_as_i64(&value).unwrap_or(0)),
            Self::Float => value_as_f64(&value)
                .and_then(Number::from_f64)
                .map_or_else(|| Value::from(0.0), Value::Number),
            Self::Boolean => Value::Bool(value_as_bool(&value).unwrap_or(false)),
            Self::Choice(_) => match value {
                Value::String(_) => value,
                // Older layouts stored the model picker default as a list
                Value::Array(items) => items
                    .into_iter()
                    .find(Value::is_string)
                    .unwrap_or_else(|| Value::String(String::new())),
                Value::Null | Value::Object(_) => Value::String(String::new()),
                other => Value::String(value_to_text(&other)),
            },
        }
    }
}

/// One field of the launch form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredDefinition", into = "StoredDefinition")]
pub struct ParameterDefinition {
    /// Human-readable label
    pub label: String,
    /// Unique key, also the lookup key of the command builder
    pub key: String,
    /// Value type
    pub kind: ParamKind,
    /// Default value, already coerced to `kind`
    pub default: Value,
}

impl ParameterDefinition {
    /// Creates a definition, coercing `default` to the kind's type.
    pub fn new(
        label: impl Into<String>,
        key: impl Into<String>,
        kind: ParamKind,
        default: impl Into<Value>,
    ) -> Self {
        let default = kind.coerce(default.into());
        Self {
            label: label.into(),
            key: key.into(),
            kind,
            default,
        }
    }

    /// Parses raw input for this field.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        self.kind
            .parse(raw)
            .with_context(|| format!("Invalid value for '{}'", self.key))
    }
}

/// On-disk shape of a definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDefinition {
    #[serde(default = "unknown_label")]
    label: String,
    key: String,
    #[serde(rename = "type", default = "text_type")]
    type_name: String,
    #[serde(default)]
    default: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
}

fn unknown_label() -> String {
    "Unknown".to_string()
}

fn text_type() -> String {
    "text".to_string()
}

impl TryFrom<StoredDefinition> for ParameterDefinition {
    type Error = anyhow::Error;

    fn try_from(stored: StoredDefinition) -> Result<Self> {
        let kind = ParamKind::from_parts(&stored.type_name, stored.options)?;
        Ok(Self::new(stored.label, stored.key, kind, stored.default))
    }
}

impl From<ParameterDefinition> for StoredDefinition {
    fn from(definition: ParameterDefinition) -> Self {
        let type_name = definition.kind.type_name().to_string();
        let options = definition.kind.options().map(<[String]>::to_vec);
        Self {
            label: definition.label,
            key: definition.key,
            type_name,
            default: definition.default,
            options,
        }
    }
}

/// Form values keyed by parameter key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterValues(BTreeMap<String, Value>);

impl ParameterValues {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the initial form state from definition defaults.
    #[must_use]
    pub fn from_defaults(definitions: &[ParameterDefinition]) -> Self {
        definitions
            .iter()
            .map(|definition| (definition.key.clone(), definition.default.clone()))
            .collect()
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layers every entry of `other` over this mapping.
    pub fn overlay(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Applies a `key=value` assignment, parsing the value with the
    /// definition registered for `key`.
    ///
    /// Returns the assigned key.
    pub fn apply_assignment(
        &mut self,
        definitions: &[ParameterDefinition],
        assignment: &str,
    ) -> Result<String> {
        let (key, raw) = assignment
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{assignment}'"))?;
        let key = key.trim();
        let definition = definitions
            .iter()
            .find(|definition| definition.key == key)
            .with_context(|| format!("Unknown parameter '{key}'"))?;
        let value = definition.parse(raw)?;
        self.0.insert(key.to_string(), value);
        Ok(key.to_string())
    }

    /// Value of `key` as text; `None` when absent, null, or empty.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            value => Some(value_to_text(value)).filter(|text| !text.is_empty()),
        }
    }

    /// Value of `key` as a boolean, accepting boolean-like strings and numbers.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(value_as_bool)
    }

    /// Value of `key` as an integer, accepting numeric strings.
    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(value_as_i64)
    }
}

impl FromIterator<(String, Value)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses the boolean spellings accepted by the form.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn display_options(options: &[String]) -> String {
    options
        .iter()
        .map(|option| {
            if option.is_empty() {
                "\"\"".to_string()
            } else {
                option.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain text form of a JSON value (strings unquoted).
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => parse_bool(text),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.fract() == 0.0 && n.is_finite())
                .map(|n| n as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
