//! Per-class property layout.
//!
//! A [`Schema`] lists the fields a class declares (with their defaults), the
//! names reserved for internal state, and custom accessors registered per
//! field. It is built once and shared between instances through an `Arc`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use arbor_types::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ObjectResult;

/// Stored properties of an object, in insertion order.
pub type Properties = IndexMap<String, Value>;

/// Custom read accessor for one field.
pub type Getter = Arc<dyn Fn(&Properties) -> ObjectResult<Value> + Send + Sync>;

/// Custom write accessor for one field.
pub type Setter = Arc<dyn Fn(&mut Properties, Value) -> ObjectResult<()> + Send + Sync>;

/// How an object treats fields its schema does not know.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unknown fields are errors.
    #[default]
    Strict,
    /// Unknown fields are stored on write and read as null when absent.
    Flexible,
}

#[derive(Clone, Default)]
struct Accessor {
    getter: Option<Getter>,
    setter: Option<Setter>,
}

/// Property layout of a class.
#[derive(Clone)]
pub struct Schema {
    class: String,
    fields: Properties,
    internal: HashSet<String>,
    accessors: HashMap<String, Accessor>,
}

impl Schema {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: Properties::new(),
            internal: HashSet::new(),
            accessors: HashMap::new(),
        }
    }

    /// Declare a field with a null default.
    pub fn field(self, name: impl Into<String>) -> Self {
        self.field_with_default(name, Value::Null)
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.insert(name.into(), default.into());
        self
    }

    /// Reserve `name` for internal state. Reads and writes of it fail.
    pub fn internal(mut self, name: impl Into<String>) -> Self {
        self.internal.insert(name.into());
        self
    }

    /// Register a custom read accessor for `name`.
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Properties) -> ObjectResult<Value> + Send + Sync + 'static,
    {
        self.accessors.entry(name.into()).or_default().getter = Some(Arc::new(getter));
        self
    }

    /// Register a custom write accessor for `name`.
    pub fn setter<F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut Properties, Value) -> ObjectResult<()> + Send + Sync + 'static,
    {
        self.accessors.entry(name.into()).or_default().setter = Some(Arc::new(setter));
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Declared fields and their defaults.
    pub fn fields(&self) -> &Properties {
        &self.fields
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_internal(&self, name: &str) -> bool {
        self.internal.contains(name)
    }

    pub fn getter_for(&self, name: &str) -> Option<&Getter> {
        self.accessors.get(name).and_then(|a| a.getter.as_ref())
    }

    pub fn setter_for(&self, name: &str) -> Option<&Setter> {
        self.accessors.get(name).and_then(|a| a.setter.as_ref())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<&String> = self.accessors.keys().collect();
        accessors.sort();
        f.debug_struct("Schema")
            .field("class", &self.class)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("accessors", &accessors)
            .finish()
    }
}
