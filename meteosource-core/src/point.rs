use std::fmt;

use serde_json::{Map, Value};

use crate::error::{MeteoError, Result};

/// Weather values at one moment, kept exactly as the API delivered them.
///
/// Used for the `current` section, every timestep of `minutely`, `hourly`,
/// `daily` and archive data, and for individual alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    fields: Map<String, Value>,
}

impl TimePoint {
    /// Wrap a raw record. Records must be JSON objects.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(MeteoError::Payload(format!(
                "expected an object record, found {}",
                kind_name(&other)
            ))),
        }
    }

    /// Field by name, or `None` when absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field by name, failing with [`MeteoError::MissingField`] when absent.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| MeteoError::MissingField(name.to_string()))
    }

    /// Nested field, e.g. `path(&["wind", "angle"])`.
    pub fn path(&self, segments: &[&str]) -> Result<&Value> {
        let (first, rest) = segments
            .split_first()
            .ok_or_else(|| MeteoError::MissingField(String::new()))?;

        let mut current = self.field(first)?;
        for (depth, segment) in rest.iter().enumerate() {
            current = current
                .get(segment)
                .ok_or_else(|| MeteoError::MissingField(segments[..depth + 2].join(".")))?;
        }
        Ok(current)
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        let value = self.field(name)?;
        value
            .as_f64()
            .ok_or_else(|| type_mismatch(name, "a number", value))
    }

    pub fn i64(&self, name: &str) -> Result<i64> {
        let value = self.field(name)?;
        value
            .as_i64()
            .ok_or_else(|| type_mismatch(name, "an integer", value))
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        let value = self.field(name)?;
        value
            .as_str()
            .ok_or_else(|| type_mismatch(name, "a string", value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.keys().collect();
        write!(
            f,
            "<TimePoint with {} fields ({})>",
            names.len(),
            names.join(", ")
        )
    }
}

fn type_mismatch(name: &str, expected: &str, found: &Value) -> MeteoError {
    MeteoError::Payload(format!(
        "field '{name}' should be {expected}, found {}",
        kind_name(found)
    ))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
