//! Records
//!
//! A [`Record`] is an open mapping from field name to [`Value`], tagged with the
//! qualified type name of its shape and carrying a [`Stamp`]. Fields are kept
//! in key order so wire output and formatting are stable.
//!
//! The stamp is assigned by the store on save and on load; application code
//! only reads it.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};

use crate::args::Selector;
use crate::stamp::Stamp;
use crate::value::Value;

/// Field name embedded in every persisted record, equal to its version path.
pub const STAMP_KEY: &str = "stamp";

/// Field name of the tombstone flag.
pub const DELETED_KEY: &str = "_deleted";

/// Open-schema, versioned unit of application data
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: BTreeMap<String, Value>,
    stamp: Stamp,
}

impl Record {
    /// Create an empty record of the given type with a placeholder stamp.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            stamp: Stamp::new(type_name.clone()),
            type_name,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Qualified type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Current stamp
    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    /// Replace the stamp. Called by the store when a version is written or read.
    #[doc(hidden)]
    pub fn set_stamp(&mut self, stamp: Stamp) {
        self.stamp = stamp;
    }

    /// Field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String form of a field; missing fields read as the empty string.
    pub fn get_str(&self, key: &str) -> String {
        self.fields
            .get(key)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge fields, later values overwriting earlier ones.
    pub fn update(&mut self, fields: impl IntoIterator<Item = (String, Value)>) {
        self.fields.extend(fields);
    }

    /// Merge all fields of another record.
    pub fn update_from(&mut self, other: &Record) {
        self.update(other.fields.clone());
    }

    /// Whether this version is tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.fields
            .get(DELETED_KEY)
            .map(Value::is_truthy)
            .unwrap_or(false)
    }

    /// Tombstone the record. The store still needs to save it.
    pub fn mark_deleted(&mut self) {
        self.set(DELETED_KEY, true);
    }

    /// Selector match: every pair's value must be a substring of the field's
    /// string form. An empty selector matches nothing.
    pub fn search(&self, selector: &Selector) -> bool {
        if selector.is_empty() {
            return false;
        }
        selector
            .iter()
            .all(|(key, want)| self.get_str(key).contains(want.as_str()))
    }

    /// Whether any field's string form contains `txt`.
    pub fn scan(&self, txt: &str) -> bool {
        self.fields.values().any(|v| v.to_string().contains(txt))
    }

    /// One-line rendering of selected fields.
    ///
    /// `keys` restricts and orders the output (all fields when `None`), `pure`
    /// drops the `key=` prefix, `skip` lists fields to leave out. Empty values
    /// and the stamp are never shown.
    pub fn format(&self, keys: Option<&[&str]>, pure: bool, skip: &[&str]) -> String {
        let all: Vec<&str> = self.keys().collect();
        let keys = keys.unwrap_or(&all);
        let mut parts = Vec::new();
        for key in keys {
            if *key == STAMP_KEY || skip.contains(key) {
                continue;
            }
            let Some(value) = self.fields.get(*key) else {
                continue;
            };
            if !value.is_truthy() {
                continue;
            }
            let text = value.to_string().trim().replace('\n', "");
            if pure {
                parts.push(text);
            } else {
                parts.push(format!("{}={}", key, text));
            }
        }
        parts.join(" ")
    }

    /// Wire form: all fields plus `stamp`, nested records stamped recursively.
    pub fn to_json(&self) -> Json {
        let mut map: Map<String, Json> = self
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != STAMP_KEY)
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        map.insert(STAMP_KEY.to_string(), Json::String(self.stamp.path()));
        Json::Object(map)
    }
}
