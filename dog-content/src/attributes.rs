//! Attribute tree of an asset and the closed set of changes applied to it.
//!
//! Attributes are a JSON object with ordered keys. Changes address one
//! top-level key and report whether they altered anything, so callers can
//! skip the persistence write for no-ops.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a value is folded into the attribute tree at a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeChange {
    /// Replace the whole subtree; a `null` value removes the key
    Set,
    /// Recursively merge objects, keeping keys the value does not mention
    Overlay,
    /// Delete the key
    Remove,
    /// Add the value to the end of the list at the key
    Append,
    /// Add the value to the front of the list at the key
    Prepend,
}

/// Hierarchical attributes stored with an asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedAttributes(Map<String, Value>);

impl NestedAttributes {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode the subtree at `key`; `None` when absent or not decodable
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Apply a change at `key`, returning true if stored state changed
    pub fn apply(&mut self, change: AttributeChange, key: &str, value: Value) -> bool {
        match change {
            AttributeChange::Set => self.set(key, value),
            AttributeChange::Overlay => self.overlay(key, value),
            AttributeChange::Remove => self.0.remove(key).is_some(),
            AttributeChange::Append => {
                self.list_at(key).push(value);
                true
            }
            AttributeChange::Prepend => {
                self.list_at(key).insert(0, value);
                true
            }
        }
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        if value.is_null() {
            return self.0.remove(key).is_some();
        }
        if self.0.get(key) == Some(&value) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    fn overlay(&mut self, key: &str, value: Value) -> bool {
        match self.0.get_mut(key) {
            Some(existing) => merge(existing, value),
            None => self.set(key, value),
        }
    }

    fn list_at(&mut self, key: &str) -> &mut Vec<Value> {
        let slot = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            let previous = slot.take();
            *slot = Value::Array(vec![previous]);
        }
        match slot {
            Value::Array(items) => items,
            _ => unreachable!("slot was just made an array"),
        }
    }
}

impl From<Map<String, Value>> for NestedAttributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Recursively merge `value` into `target`, returning true if anything changed
fn merge(target: &mut Value, value: Value) -> bool {
    match (target, value) {
        (Value::Object(existing), Value::Object(incoming)) => {
            let mut changed = false;
            for (key, incoming_value) in incoming {
                match existing.get_mut(&key) {
                    Some(current) => changed |= merge(current, incoming_value),
                    None => {
                        existing.insert(key, incoming_value);
                        changed = true;
                    }
                }
            }
            changed
        }
        (target, value) => {
            if *target == value {
                false
            } else {
                *target = value;
                true
            }
        }
    }
}
