//! Telemetry records - one decoded snapshot pushed by the server.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single telemetry field value.
///
/// Records are flat: every field is a boolean, a number or a string.
/// Integers are kept apart from floats so that `42` round-trips as `42`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    /// A boolean flag (e.g. `brake_engaged`).
    Bool(bool),
    /// A whole number.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// Free text (e.g. a mode or state name).
    Text(String),
}

impl TelemetryValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TelemetryValue::Integer(v) => Some(*v as f64),
            TelemetryValue::Float(v) => Some(*v),
            TelemetryValue::Bool(_) | TelemetryValue::Text(_) => None,
        }
    }

    /// Short name of the value kind, for display.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryValue::Bool(_) => "bool",
            TelemetryValue::Integer(_) => "int",
            TelemetryValue::Float(_) => "float",
            TelemetryValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryValue::Bool(v) => write!(f, "{}", v),
            TelemetryValue::Integer(v) => write!(f, "{}", v),
            TelemetryValue::Float(v) => write!(f, "{:.3}", v),
            TelemetryValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for TelemetryValue {
    fn from(v: bool) -> Self {
        TelemetryValue::Bool(v)
    }
}

impl From<i32> for TelemetryValue {
    fn from(v: i32) -> Self {
        TelemetryValue::Integer(v.into())
    }
}

impl From<i64> for TelemetryValue {
    fn from(v: i64) -> Self {
        TelemetryValue::Integer(v)
    }
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        TelemetryValue::Float(v)
    }
}

impl From<&str> for TelemetryValue {
    fn from(v: &str) -> Self {
        TelemetryValue::Text(v.to_string())
    }
}

impl From<String> for TelemetryValue {
    fn from(v: String) -> Self {
        TelemetryValue::Text(v)
    }
}

/// One telemetry snapshot: field name to value.
///
/// Serializes as a plain JSON object, e.g. `{"speed": 42, "heading": 180}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryData(BTreeMap<String, TelemetryValue>);

impl TelemetryData {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<TelemetryValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<TelemetryValue>,
    ) -> Option<TelemetryValue> {
        self.0.insert(field.into(), value.into())
    }

    /// Get a field by name.
    pub fn get(&self, field: &str) -> Option<&TelemetryValue> {
        self.0.get(field)
    }

    /// Overwrite fields with those present in `other`; fields `other` lacks are kept.
    pub fn merge(&mut self, other: &TelemetryData) {
        for (field, value) in other.iter() {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, TelemetryValue> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<TelemetryValue>> FromIterator<(K, V)> for TelemetryData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a TelemetryData {
    type Item = (&'a String, &'a TelemetryValue);
    type IntoIter = btree_map::Iter<'a, String, TelemetryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_integers_apart_from_floats() {
        let data: TelemetryData =
            serde_json::from_str(r#"{"speed": 42, "voltage": 12.6, "mode": "auto", "ok": true}"#)
                .unwrap();
        assert_eq!(data.get("speed"), Some(&TelemetryValue::Integer(42)));
        assert_eq!(data.get("voltage"), Some(&TelemetryValue::Float(12.6)));
        assert_eq!(data.get("mode"), Some(&TelemetryValue::Text("auto".into())));
        assert_eq!(data.get("ok"), Some(&TelemetryValue::Bool(true)));
    }

    #[test]
    fn test_nested_values_are_rejected() {
        assert!(serde_json::from_str::<TelemetryData>(r#"{"pose": {"x": 1}}"#).is_err());
        assert!(serde_json::from_str::<TelemetryData>(r#"{"gap": null}"#).is_err());
        assert!(serde_json::from_str::<TelemetryData>(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_merge_overwrites_and_keeps() {
        let mut base = TelemetryData::new().with("speed", 10).with("heading", 90);
        base.merge(&TelemetryData::new().with("speed", 12).with("battery", 87.5));

        assert_eq!(base.len(), 3);
        assert_eq!(base.get("speed"), Some(&TelemetryValue::Integer(12)));
        assert_eq!(base.get("heading"), Some(&TelemetryValue::Integer(90)));
    }

    #[test]
    fn test_value_views() {
        assert_eq!(TelemetryValue::from(3).as_f64(), Some(3.0));
        assert_eq!(TelemetryValue::from("x").as_f64(), None);
        assert_eq!(TelemetryValue::from(1.25).to_string(), "1.250");
        assert_eq!(TelemetryValue::from(false).kind(), "bool");
    }
}
