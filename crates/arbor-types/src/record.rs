use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::value::Value;

/// An object instance.
///
/// A record carries its class name, the ancestor classes and interfaces it
/// satisfies, and its named fields in declaration order. Instance checks
/// against a [`TypeTag::Instance`](crate::TypeTag::Instance) match the class
/// itself or any entry of the lineage, ignoring ASCII case.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    class: String,
    lineage: Vec<String>,
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            lineage: Vec::new(),
            fields: IndexMap::new(),
        }
    }

    /// Add ancestor classes or interfaces this record satisfies.
    pub fn with_lineage<I, S>(mut self, lineage: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lineage.extend(lineage.into_iter().map(Into::into));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Returns `true` if this record is an instance of `class`.
    pub fn is_instance_of(&self, class: &str) -> bool {
        self.class.eq_ignore_ascii_case(class)
            || self.lineage.iter().any(|c| c.eq_ignore_ascii_case(class))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

impl Serialize for Record {
    /// Records serialize as an object of their fields.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_checks_cover_lineage() {
        let record = Record::new("Admin").with_lineage(["User", "Serializable"]);
        assert!(record.is_instance_of("Admin"));
        assert!(record.is_instance_of("user"));
        assert!(record.is_instance_of("Serializable"));
        assert!(!record.is_instance_of("Post"));
    }

    #[test]
    fn fields_keep_declaration_order() {
        let record = Record::new("Point").with_field("y", 2).with_field("x", 1);
        let names: Vec<_> = record.fields().keys().cloned().collect();
        assert_eq!(names, vec!["y", "x"]);
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"y":2,"x":1}"#);
    }

    #[test]
    fn set_field_overwrites() {
        let mut record = Record::new("Point").with_field("x", 1);
        assert_eq!(record.set_field("x", 5), Some(Value::Int(1)));
        assert_eq!(record.field("x"), Some(&Value::Int(5)));
    }
}
