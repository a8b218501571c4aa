use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::game_type::GameType;

/// Keys the declared type has historically been stored under, in precedence
/// order. Inferred types are written back under the first one.
pub const DECLARED_TYPE_KEYS: [&str; 2] = ["game_type", "gameType"];

/// Raw structured content of a leaf document. Always a JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// First non-empty string under one of [`DECLARED_TYPE_KEYS`].
    pub fn declared_type(&self) -> Option<&str> {
        DECLARED_TYPE_KEYS.iter().find_map(|key| match self.0.get(*key) {
            Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.as_str()),
            _ => None,
        })
    }

    pub fn set_declared_type(&mut self, game_type: GameType) {
        self.0.insert(
            DECLARED_TYPE_KEYS[0].to_string(),
            Value::String(game_type.as_str().to_string()),
        );
    }

    pub fn title(&self) -> Option<&str> {
        match self.0.get("title") {
            Some(Value::String(title)) if !title.trim().is_empty() => Some(title.as_str()),
            _ => None,
        }
    }

    /// Length of the array under `key`, if it is one.
    pub fn array_len(&self, key: &str) -> Option<usize> {
        match self.0.get(key) {
            Some(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
