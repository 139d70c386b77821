//! # Application configuration values.
//!
//! Provides [`Config`], a read-mostly tree of configuration values backed by
//! [`serde_json::Value`]. Loading and merging files is the caller's concern;
//! the supervisor only threads the assembled tree through the
//! [`Handle`](crate::Handle) so components can read their settings.
//!
//! ## Path syntax
//! Keys use dotted paths: `get("bus.orders.provider")` walks nested objects.
//! [`Config::set`] creates intermediate objects as needed.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Tree of application configuration values.
///
/// Cheap to clone for small trees; the supervisor shares one instance
/// behind an `Arc`, so component reads never copy.
#[derive(Clone, Debug, Default)]
pub struct Config {
    root: Value,
}

impl Config {
    /// Creates an empty configuration tree.
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Wraps an already-assembled value tree (e.g. parsed from a file by the caller).
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Returns the value at the dotted `key` path, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut node = &self.root;
        for part in key.split('.') {
            node = node.as_object()?.get(part)?;
        }
        Some(node)
    }

    /// Returns the string at `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Returns the integer at `key`, if present and an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }

    /// Returns the boolean at `key`, if present and a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    /// Returns the subtree rooted at `key` as its own [`Config`].
    pub fn sub(&self, key: &str) -> Option<Config> {
        self.get(key).cloned().map(Config::from_value)
    }

    /// Sets the value at the dotted `key` path, creating objects along the way.
    ///
    /// A non-object value sitting on the path is replaced by an object.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if !self.root.is_object() {
            self.root = Value::Object(Map::new());
        }
        let mut node = &mut self.root;
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let map = match node.as_object_mut() {
                Some(map) => map,
                None => return,
            };
            if parts.peek().is_none() {
                map.insert(part.to_string(), value.into());
                return;
            }
            node = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    /// Applies every `(key, value)` override in order via [`Config::set`].
    pub fn merge(&mut self, overrides: Map<String, Value>) {
        for (key, value) in overrides {
            self.set(&key, value);
        }
    }

    /// Deserializes the whole tree into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.root.clone())
    }
}

impl From<Value> for Config {
    fn from(root: Value) -> Self {
        Config::from_value(root)
    }
}
