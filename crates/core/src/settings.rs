//! Settings supplied through the input file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// Key under which the current target is exposed to checks.
pub const TARGET_KEY: &str = "target";

/// Flat, ordered map of input names to their string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the input file contents.
    ///
    /// The document must be a mapping; an empty document yields no settings.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(map) => Ok(Self(
                map.iter()
                    .map(|(k, v)| (render_value(k), render_value(v)))
                    .collect(),
            )),
            other => Err(CoreError::NotAMapping(value_kind(&other))),
        }
    }

    /// Get a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether a value is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Target of this context, if any.
    pub fn target(&self) -> Option<&str> {
        self.get(TARGET_KEY)
    }
}

impl FromIterator<(String, String)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build one execution context per target.
///
/// Without targets the settings are used as-is. Each target is layered
/// underneath the settings, so a `target` key in the input file wins.
pub fn prepare_contexts(targets: &[String], settings: &Settings) -> Vec<Settings> {
    let targets: Vec<&str> = targets
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if targets.is_empty() {
        return vec![settings.clone()];
    }

    targets
        .into_iter()
        .map(|t| {
            let mut conf = Settings::new();
            conf.insert(TARGET_KEY, t);
            for (k, v) in settings.iter() {
                conf.insert(k, v);
            }
            conf
        })
        .collect()
}

/// Render a YAML value the way it is substituted into checks.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => render_value(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => serde_json::to_string(value)
            .unwrap_or_else(|_| serde_yaml::to_string(value).unwrap_or_default().trim().to_string()),
    }
}

/// Human-readable kind of a YAML value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
