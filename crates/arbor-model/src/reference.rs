//! Document references.
//!
//! A reference field holds either a database reference, a two-entry map
//! `{"$ref": collection, "$id": id}`, or a bare id whose collection is fixed by
//! the field's configuration.

use arbor_types::{Key, Value, ValueMap};
use serde::{Deserialize, Serialize};

/// Map key holding the referenced collection.
pub const REF_KEY: &str = "$ref";
/// Map key holding the referenced id.
pub const ID_KEY: &str = "$id";

/// How a reference field stores its target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// `{"$ref", "$id"}` map naming the collection.
    #[serde(rename = "dbref")]
    DbRef,
    /// Bare id into the named collection.
    Manual(String),
}

/// A resolved reference to one document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocRef {
    pub collection: String,
    pub id: Value,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Returns `true` if `value` has the database reference shape.
    pub fn is_ref(value: &Value) -> bool {
        Self::from_value(value).is_some()
    }

    /// Read a database reference map. Other values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_array()?;
        let collection = map.get(&Key::from(REF_KEY))?.as_str()?;
        let id = map.get(&Key::from(ID_KEY))?;
        if id.is_null() {
            return None;
        }
        Some(Self::new(collection, id.clone()))
    }

    /// The database reference map for this target.
    pub fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert(REF_KEY, self.collection.as_str());
        map.insert(ID_KEY, self.id.clone());
        Value::Array(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbref_roundtrip() {
        let r = DocRef::new("users", "abc");
        let value = r.to_value();
        assert_eq!(value.to_json().unwrap(), r#"{"$ref":"users","$id":"abc"}"#);
        assert_eq!(DocRef::from_value(&value), Some(r));
    }

    #[test]
    fn non_references_are_rejected() {
        assert!(!DocRef::is_ref(&Value::from("abc")));
        assert!(!DocRef::is_ref(&Value::from_json(r#"{"$ref":"users"}"#).unwrap()));
        assert!(!DocRef::is_ref(&Value::from_json(r#"{"$ref":"users","$id":null}"#).unwrap()));
        assert!(DocRef::is_ref(&Value::from_json(r#"{"$ref":"users","$id":7}"#).unwrap()));
    }

    #[test]
    fn ref_kind_serde_names() {
        let kinds: Vec<RefKind> =
            serde_json::from_str(r#"["dbref", {"manual": "groups"}]"#).unwrap();
        assert_eq!(kinds, vec![RefKind::DbRef, RefKind::Manual("groups".into())]);
    }
}
