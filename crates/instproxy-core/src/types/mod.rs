//! Shared message and result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured key/value message exchanged over the command channel.
pub type Message = Map<String, Value>;

/// Caller-supplied options forwarded verbatim with each command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOptions(Map<String, Value>);

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, replacing any previous value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ClientOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Installed-application entries collected by a Browse, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseResult {
    entries: Vec<Value>,
}

impl BrowseResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message's list data, preserving its order.
    pub fn extend_chunk(&mut self, chunk: impl IntoIterator<Item = Value>) {
        self.entries.extend(chunk);
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Value> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `CFBundleIdentifier` of every entry that has one.
    pub fn bundle_identifiers(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| entry.get("CFBundleIdentifier"))
            .filter_map(Value::as_str)
            .collect()
    }
}

impl IntoIterator for BrowseResult {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
