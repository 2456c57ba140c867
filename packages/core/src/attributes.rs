//! Ordered, string-keyed node attributes.

use serde::{Deserialize, Serialize};
use stringdoc_markup::escape_attribute;

/// Attributes of one node, kept in insertion order.
///
/// Keys are unique: setting an existing key overwrites its value in place, so
/// the attribute keeps its original position in the rendered tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    name: String,
    value: String,
    /// Emitted without `=""` while the value stays empty.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    bare: bool,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == key)
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.insert(key.into(), value.into(), false)
    }

    /// Sets `key` as a boolean attribute, written as a bare name.
    pub fn set_bare(&mut self, key: impl Into<String>) -> Option<String> {
        self.insert(key.into(), String::new(), true)
    }

    fn insert(&mut self, name: String, value: String, bare: bool) -> Option<String> {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(existing) => {
                existing.bare = bare;
                Some(std::mem::replace(&mut existing.value, value))
            }
            None => {
                self.entries.push(Entry { name, value, bare });
                None
            }
        }
    }

    /// Removes `key`, returning its value if it was present.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|entry| entry.name == key)?;
        Some(self.entries.remove(index).value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
    }

    /// Appends ` name="value"` for every attribute to `output`.
    pub fn write_to(&self, output: &mut String) {
        for entry in &self.entries {
            output.push(' ');
            output.push_str(&entry.name);
            if entry.bare && entry.value.is_empty() {
                continue;
            }
            output.push_str("=\"");
            output.push_str(&escape_attribute(&entry.value));
            output.push('"');
        }
    }
}

impl std::fmt::Display for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = String::new();
        self.write_to(&mut output);
        f.write_str(&output)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.set(key, value);
        }
        attributes
    }
}
