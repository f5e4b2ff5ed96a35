//! Clean string maps for free-form `data` bags.
//!
//! Markers and lines carry user-defined field values keyed by field name.
//! Those keys come from remote users, so the bag is always rebuilt as a fresh
//! map of plain strings before anything probes it: whatever the sender put
//! in, the result only holds the entries below and nothing else.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Key of the free-form bag inside marker and line payloads.
pub const DATA_KEY: &str = "data";

/// A string-to-string map with no entries besides the ones inserted.
///
/// String values are kept, numbers and booleans are stringified, and
/// `null`, arrays and objects are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafeMap(BTreeMap<String, String>);

impl SafeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a bag from an arbitrary JSON value. Non-objects give an empty map.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(entries) = value else {
            return Self::new();
        };
        Self(
            entries
                .iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        Value::Null | Value::Array(_) | Value::Object(_) => return None,
                    };
                    Some((key.clone(), value))
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// JSON object with the same entries.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect::<Map<_, _>>())
    }
}

impl<'de> Deserialize<'de> for SafeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SafeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Replace the `data` bag of a marker or line payload with its clean form.
/// Payloads without a bag pass through unchanged.
#[must_use]
pub fn normalize_data_bag(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    if let Some(bag) = map.get_mut(DATA_KEY) {
        if !bag.is_null() {
            *bag = SafeMap::from_value(bag).to_value();
        }
    }
    Value::Object(map)
}

#[cfg(test)]
#[path = "safe_map_test.rs"]
mod tests;
