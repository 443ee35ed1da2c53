// Path: crates/test_utils/src/fields.rs
//! Structured payload attached to a log record.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// An insertion-ordered map from field name to a JSON value.
///
/// Re-inserting an existing key replaces its value but keeps its original
/// position, so rendering is deterministic for a given sequence of inserts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, serializing it to JSON.
    ///
    /// A value that fails to serialize is stored as a string describing the
    /// failure rather than dropping the field.
    pub fn insert<V: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &V) {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)));
        self.insert_value(key.into(), value);
    }

    /// Builder form of [`Fields::insert`].
    pub fn with<V: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &V) -> Self {
        self.insert(key, value);
        self
    }

    /// Stores the `Display` rendering of `value`. Used for errors, which
    /// rarely implement `Serialize`.
    pub fn with_display(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert_value(key.into(), Value::String(value.to_string()));
        self
    }

    fn insert_value(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns a copy of `self` with every entry of `other` merged in.
    /// Entries from `other` win on key collision.
    pub fn merged(&self, other: &Fields) -> Fields {
        let mut out = self.clone();
        for (k, v) in &other.entries {
            out.insert_value(k.clone(), v.clone());
        }
        out
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The set as a JSON object, for structured sinks.
    pub fn to_json(&self) -> Value {
        Value::Object(self.entries.iter().cloned().collect())
    }

    /// Renders ` key=value` per entry in insertion order. Strings are
    /// written bare, everything else as compact JSON.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push(' ');
            out.push_str(key);
            out.push('=');
            match value {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert_value(k.into(), v);
        }
        fields
    }
}

/// Builds a [`Fields`] set from `key => value` pairs.
///
/// ```
/// use pylons_test_utils::fields;
///
/// let f = fields! { "account" => "alice", "height" => 42 };
/// assert_eq!(f.render(), " account=alice height=42");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $( fields.insert($key, &$value); )+
        fields
    }};
}
