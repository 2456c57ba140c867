//! Node labels: metadata attached to a node that is never rendered.

use serde::{Deserialize, Serialize};

/// Value of a single label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    Flag(bool),
    Text(String),
    /// Ordered segments, e.g. a binding channel.
    Path(Vec<String>),
}

impl LabelValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LabelValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&[String]> {
        match self {
            LabelValue::Path(segments) => Some(segments),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            LabelValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl std::fmt::Display for LabelValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelValue::Flag(flag) => write!(f, "{flag}"),
            LabelValue::Text(text) => f.write_str(text),
            LabelValue::Path(segments) => f.write_str(&segments.join(":")),
        }
    }
}

impl PartialEq<str> for LabelValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for LabelValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        LabelValue::Text(value.to_string())
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        LabelValue::Text(value)
    }
}

impl From<bool> for LabelValue {
    fn from(value: bool) -> Self {
        LabelValue::Flag(value)
    }
}

impl From<Vec<String>> for LabelValue {
    fn from(value: Vec<String>) -> Self {
        LabelValue::Path(value)
    }
}

/// Ordered label map of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    entries: Vec<(String, LabelValue)>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&LabelValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<LabelValue>,
    ) -> Option<LabelValue> {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn delete(&mut self, key: &str) -> Option<LabelValue> {
        let index = self.entries.iter().position(|(name, _)| name == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<LabelValue>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for (key, value) in iter {
            labels.set(key, value);
        }
        labels
    }
}
