//! User configuration decoding.
//!
//! The workflow passes the user's build preferences as a JSON object in an
//! environment variable. When the value is forwarded into a Linux container
//! it arrives wrapped in an extra pair of double quotes.

use cbci_core::EnvSource;
use serde_json::{Map, Value};

use crate::{ConfigError, ConfigResult};

/// Keys consumed by the matrix builder rather than the option emitter.
pub const STAGE_MATRIX_KEYS: [&str; 4] =
    ["python-versions", "python_versions", "arches", "platforms"];

/// Decoded user configuration, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserConfig {
    values: Map<String, Value>,
}

impl UserConfig {
    /// Read and decode the configuration stored in `key`. An unset or empty
    /// variable yields an empty configuration.
    pub fn from_env(env: &impl EnvSource, key: &str) -> ConfigResult<Self> {
        match env.optional(key) {
            Some(raw) => Self::parse(&raw),
            None => Ok(Self::default()),
        }
    }

    /// Decode a raw JSON string, undoing container-injected quoting.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let unwrapped = if raw.starts_with('"') {
            strip_outer(raw)
        } else {
            raw
        };

        match serde_json::from_str::<Value>(unwrapped)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ConfigError::NotAnObject(json_type_name(&other).to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The first present key rendered as a comma/space separated list.
    /// Arrays are joined; other scalars are rendered as text.
    pub fn list_text(&self, keys: &[&str]) -> String {
        let Some(value) = keys.iter().find_map(|k| self.values.get(*k)) else {
            return String::new();
        };
        match value {
            Value::Array(items) => items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(" "),
            other => scalar_text(other),
        }
    }
}

/// Drop exactly the first and last character.
fn strip_outer(raw: &str) -> &str {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
