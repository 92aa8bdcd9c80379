use std::sync::Arc;

use arbor_types::Value;
use tracing::trace;

use crate::access::PropertyAccess;
use crate::error::{ObjectError, ObjectResult};
use crate::schema::{Mode, Properties, Schema};

static NULL: Value = Value::Null;

/// Which properties [`DynamicObject::properties`] returns.
#[derive(Clone, Copy, Debug)]
pub enum Selection<'a> {
    /// Every stored property.
    All,
    /// The named properties, in the given order.
    Fields(&'a [&'a str]),
}

/// An object whose fields are resolved at run time against a [`Schema`].
///
/// Writes go through [`PropertyAccess::set`]:
///
/// 1. String values are trimmed; an empty string is stored as null.
/// 2. Internal names are rejected.
/// 3. A registered setter handles the write.
/// 4. Stored and declared fields are written directly.
/// 5. Flexible objects store any other field; strict objects reject it.
///
/// Reads mirror the same order, with flexible objects reading unknown fields
/// as null.
#[derive(Clone, Debug)]
pub struct DynamicObject {
    schema: Arc<Schema>,
    mode: Mode,
    properties: Properties,
}

impl DynamicObject {
    /// An object holding the schema's declared defaults.
    pub fn new(schema: Arc<Schema>, mode: Mode) -> Self {
        let properties = schema.fields().clone();
        Self {
            schema,
            mode,
            properties,
        }
    }

    /// An object with `properties` applied through the normal write path.
    pub fn with_properties<I, K, V>(
        schema: Arc<Schema>,
        mode: Mode,
        properties: I,
    ) -> ObjectResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut object = Self::new(schema, mode);
        object.set_properties(properties)?;
        Ok(object)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn class(&self) -> &str {
        self.schema.class()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The stored value of `name`, or null. Accessors are not consulted.
    pub fn property(&self, name: &str) -> &Value {
        self.properties.get(name).unwrap_or(&NULL)
    }

    /// A copy of the selected stored properties.
    ///
    /// With [`Selection::All`], `ignore_nulls` drops null values. With
    /// [`Selection::Fields`], missing or null names are returned as null
    /// unless `ignore_nulls` is set, in which case they are left out.
    pub fn properties(&self, selection: Selection<'_>, ignore_nulls: bool) -> Properties {
        match selection {
            Selection::All => self
                .properties
                .iter()
                .filter(|(_, v)| !(ignore_nulls && v.is_null()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Selection::Fields(names) => names
                .iter()
                .filter_map(|name| match self.properties.get(*name) {
                    Some(v) if !v.is_null() => Some((name.to_string(), v.clone())),
                    _ if ignore_nulls => None,
                    _ => Some((name.to_string(), Value::Null)),
                })
                .collect(),
        }
    }

    /// All stored properties, including nulls.
    pub fn raw_properties(&self) -> &Properties {
        &self.properties
    }

    /// Write `name` directly, bypassing filters and accessors.
    pub fn store(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    fn undefined(&self, name: &str) -> ObjectError {
        ObjectError::Undefined {
            class: self.class().to_string(),
            name: name.to_string(),
        }
    }

    fn inaccessible(&self, name: &str) -> ObjectError {
        ObjectError::Inaccessible {
            class: self.class().to_string(),
            name: name.to_string(),
        }
    }
}

/// Trim strings and turn blank strings into null.
pub fn filter_input(value: Value) -> Value {
    match value {
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else if trimmed.len() == s.len() {
                Value::Str(s)
            } else {
                Value::Str(trimmed.to_string())
            }
        }
        other => other,
    }
}

impl PropertyAccess for DynamicObject {
    fn get(&self, field: &str) -> ObjectResult<Value> {
        if self.schema.is_internal(field) {
            return Err(self.inaccessible(field));
        }
        if let Some(getter) = self.schema.getter_for(field) {
            return getter(&self.properties);
        }
        if let Some(value) = self.properties.get(field) {
            return Ok(value.clone());
        }
        if self.schema.is_declared(field) || self.mode == Mode::Flexible {
            return Ok(Value::Null);
        }
        Err(self.undefined(field))
    }

    fn set(&mut self, field: &str, value: Value) -> ObjectResult<()> {
        let value = filter_input(value);
        if self.schema.is_internal(field) {
            return Err(self.inaccessible(field));
        }
        if let Some(setter) = self.schema.setter_for(field).cloned() {
            trace!(class = self.class(), field, "property write via accessor");
            return setter(&mut self.properties, value);
        }
        if self.properties.contains_key(field)
            || self.schema.is_declared(field)
            || self.mode == Mode::Flexible
        {
            self.properties.insert(field.to_string(), value);
            return Ok(());
        }
        Err(self.undefined(field))
    }
}
