//! Telemetry conditions that start a sequence.

use std::fmt;

use telewatch_types::{TelemetryData, TelemetryValue};

/// Test applied to one telemetry field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Numeric value strictly greater than the threshold.
    Above(f64),
    /// Numeric value strictly less than the threshold.
    Below(f64),
    /// Value equal to the given one. Integers and floats compare numerically.
    Equals(TelemetryValue),
}

impl Condition {
    fn holds(&self, value: &TelemetryValue) -> bool {
        match self {
            Condition::Above(threshold) => value.as_f64().is_some_and(|v| v > *threshold),
            Condition::Below(threshold) => value.as_f64().is_some_and(|v| v < *threshold),
            Condition::Equals(expected) => match (value.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => value == expected,
            },
        }
    }
}

/// A condition on a named field.
///
/// # Example
///
/// ```
/// use telewatch::sequence::{Condition, Trigger};
/// use telewatch_types::TelemetryData;
///
/// let trigger = Trigger::new("battery", Condition::Below(20.0));
/// assert!(trigger.matches(&TelemetryData::new().with("battery", 12.5)));
/// assert!(!trigger.matches(&TelemetryData::new().with("speed", 3)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Field to watch.
    pub field: String,
    /// Test the field must pass.
    pub condition: Condition,
}

impl Trigger {
    /// Create a trigger.
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }

    /// Check the trigger against a record. A missing field never matches.
    pub fn matches(&self, data: &TelemetryData) -> bool {
        data.get(&self.field).is_some_and(|value| self.condition.holds(value))
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            Condition::Above(v) => write!(f, "{} > {}", self.field, v),
            Condition::Below(v) => write!(f, "{} < {}", self.field, v),
            Condition::Equals(v) => write!(f, "{} == {}", self.field, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_strict() {
        let above = Trigger::new("speed", Condition::Above(10.0));
        assert!(!above.matches(&TelemetryData::new().with("speed", 10)));
        assert!(above.matches(&TelemetryData::new().with("speed", 10.5)));

        let below = Trigger::new("speed", Condition::Below(0.0));
        assert!(below.matches(&TelemetryData::new().with("speed", -1)));
        assert!(!below.matches(&TelemetryData::new().with("speed", "fast")));
    }

    #[test]
    fn test_equals_mixes_numeric_kinds() {
        let trigger = Trigger::new("stage", Condition::Equals(TelemetryValue::Integer(2)));
        assert!(trigger.matches(&TelemetryData::new().with("stage", 2.0)));

        let mode = Trigger::new("mode", Condition::Equals("auto".into()));
        assert!(mode.matches(&TelemetryData::new().with("mode", "auto")));
        assert!(!mode.matches(&TelemetryData::new().with("mode", "teleop")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Trigger::new("battery", Condition::Below(20.0)).to_string(), "battery < 20");
    }
}
