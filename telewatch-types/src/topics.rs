//! Subscription topics.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The telemetry channel(s) a client subscribes to.
///
/// Opaque to the client: the value is sent to the server as-is, either as a
/// single string or as an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Topics {
    /// A single topic name.
    One(String),
    /// Several topic names, in the order given.
    Many(Vec<String>),
}

impl Topics {
    /// Topic names in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Topics::One(name) => vec![name.as_str()],
            Topics::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// The JSON payload carried by a `subscribe` command.
    pub fn to_payload(&self) -> Value {
        match self {
            Topics::One(name) => Value::String(name.clone()),
            Topics::Many(names) => Value::Array(names.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl fmt::Display for Topics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

impl From<&str> for Topics {
    fn from(name: &str) -> Self {
        Topics::One(name.to_string())
    }
}

impl From<String> for Topics {
    fn from(name: String) -> Self {
        Topics::One(name)
    }
}

impl From<Vec<String>> for Topics {
    fn from(names: Vec<String>) -> Self {
        Topics::Many(names)
    }
}

impl From<&[&str]> for Topics {
    fn from(names: &[&str]) -> Self {
        Topics::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_verbatim() {
        assert_eq!(Topics::from("drive").to_payload(), serde_json::json!("drive"));
        assert_eq!(
            Topics::from(&["drive", "arm"][..]).to_payload(),
            serde_json::json!(["drive", "arm"])
        );
    }

    #[test]
    fn test_display_joins_names() {
        let topics = Topics::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(topics.to_string(), "a,b");
    }
}
