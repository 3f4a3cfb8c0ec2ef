use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{AdminError, Result};

/// A store payload with normalized keys and typed, tolerant accessors.
///
/// Keys are matched case-insensitively with `-` and `_` treated alike. Each
/// accessor takes a list of accepted names and returns the zero value when
/// none is present or the value has an unexpected type.
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    fields: HashMap<String, Value>,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

impl RawFields {
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Ok(Self::default()),
            other => Err(AdminError::conversion(format!(
                "expected a mapping, got {}",
                type_name(other)
            ))),
        }
    }

    pub fn from_map(map: &Map<String, Value>) -> Self {
        let fields = map
            .iter()
            .map(|(k, v)| (normalize_key(k), v.clone()))
            .collect();
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn lookup(&self, names: &[&str]) -> Option<&Value> {
        names
            .iter()
            .find_map(|name| self.fields.get(&normalize_key(name)))
            .filter(|v| !v.is_null())
    }

    /// Whole seconds or counts. Floats without a fractional part are accepted.
    pub fn integer(&self, names: &[&str]) -> i64 {
        match self.lookup(names) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .unwrap_or_default(),
            _ => 0,
        }
    }

    pub fn flag(&self, names: &[&str]) -> bool {
        matches!(self.lookup(names), Some(Value::Bool(true)))
    }

    /// A delimited string. Arrays of strings are joined with `,`.
    pub fn text(&self, names: &[&str]) -> String {
        match self.lookup(names) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => strings(items).join(","),
            _ => String::new(),
        }
    }

    /// An ordered sequence. A comma-delimited string is split.
    pub fn list(&self, names: &[&str]) -> Vec<String> {
        match self.lookup(names) {
            Some(Value::Array(items)) => strings(items),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
