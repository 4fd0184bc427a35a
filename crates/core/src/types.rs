//! Type registry
//!
//! Maps qualified type names (`module.Shape`) to factories that build an empty
//! record of that shape. Loading a version reconstructs the right shape from the
//! type name in its path, and nested objects from the type name in their
//! embedded `stamp`.
//!
//! The registry is a cheap-to-clone handle; every clone sees the same table.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value as Json};

use crate::error::{Error, Result};
use crate::record::{Record, STAMP_KEY};
use crate::stamp::Stamp;
use crate::value::Value;

/// Builds an empty record of one shape.
pub type Factory = Arc<dyn Fn() -> Record + Send + Sync>;

/// Type-name to factory table
#[derive(Clone, Default)]
pub struct TypeRegistry {
    factories: Arc<Mutex<BTreeMap<String, Factory>>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `type_name`, replacing any earlier one.
    pub fn register<F>(&self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Record + Send + Sync + 'static,
    {
        self.factories
            .lock()
            .insert(type_name.into(), Arc::new(factory));
    }

    /// Register a shape with no default fields.
    pub fn register_open(&self, type_name: impl Into<String>) {
        let type_name = type_name.into();
        let name = type_name.clone();
        self.register(type_name, move || Record::new(name.clone()));
    }

    /// Whether `type_name` is known
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.lock().contains_key(type_name)
    }

    /// Registered type names in order
    pub fn names(&self) -> Vec<String> {
        self.factories.lock().keys().cloned().collect()
    }

    /// Resolve a short, case-insensitive name (`log`) to a qualified one (`log.Log`).
    ///
    /// A qualified name that is registered resolves to itself.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let factories = self.factories.lock();
        if factories.contains_key(name) {
            return Some(name.to_string());
        }
        let wanted = name.to_lowercase();
        factories
            .keys()
            .find(|qualified| {
                qualified
                    .rsplit('.')
                    .next()
                    .is_some_and(|short| short.to_lowercase() == wanted)
            })
            .cloned()
    }

    /// Build an empty record of `type_name`.
    pub fn create(&self, type_name: &str) -> Result<Record> {
        let factory = self
            .factories
            .lock()
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::NoSuchType(type_name.to_string()))?;
        Ok(factory())
    }

    /// Decode the top-level object of a version file into fields.
    ///
    /// The object's own `stamp` is dropped; nested stamped objects are rebuilt
    /// as records of their embedded type.
    pub fn decode_fields(&self, object: Map<String, Json>) -> Result<Vec<(String, Value)>> {
        object
            .into_iter()
            .filter(|(k, _)| k != STAMP_KEY)
            .map(|(k, v)| Ok((k, self.decode_value(v)?)))
            .collect()
    }

    /// Decode one wire value.
    pub fn decode_value(&self, json: Json) -> Result<Value> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|v| self.decode_value(v))
                    .collect::<Result<_>>()?,
            ),
            Json::Object(object) => match object.get(STAMP_KEY).and_then(Json::as_str) {
                Some(path) => {
                    let path = path.to_string();
                    Value::Record(Box::new(self.decode_record(&path, object)?))
                }
                None => Value::Map(
                    object
                        .into_iter()
                        .map(|(k, v)| Ok((k, self.decode_value(v)?)))
                        .collect::<Result<_>>()?,
                ),
            },
        })
    }

    fn decode_record(&self, path: &str, object: Map<String, Json>) -> Result<Record> {
        let type_name = path.split('/').next().unwrap_or_default();
        if type_name.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let mut record = self.create(type_name)?;
        record.update(self.decode_fields(object)?);
        if let Ok(stamp) = Stamp::parse(path) {
            record.set_stamp(stamp);
        }
        Ok(record)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}
