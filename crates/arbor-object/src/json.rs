use std::fmt;

use arbor_types::{Key, Value, ValueMap};
use serde::{Serialize, Serializer};

use crate::access::PropertyAccess;
use crate::error::{ObjectError, ObjectResult};

static NULL: Value = Value::Null;

/// A free-form object that reads like a JSON object.
///
/// Entries can be addressed by key or as properties; missing entries read as
/// null. The object is built from a JSON string or a map, merged over a set of
/// defaults: string keys in the input replace defaults, integer-keyed entries
/// are appended and renumbered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonObject {
    entries: ValueMap,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(input: ValueMap) -> Self {
        Self::with_defaults(&ValueMap::new(), input)
    }

    /// Merge `input` over `defaults`.
    pub fn with_defaults(defaults: &ValueMap, input: ValueMap) -> Self {
        let mut entries = ValueMap::new();
        let mut index: i64 = 0;
        for (key, value) in defaults.iter().map(|(k, v)| (k.clone(), v.clone())).chain(input) {
            match key {
                Key::Int(_) => {
                    entries.insert(index, value);
                    index += 1;
                }
                key @ Key::Str(_) => {
                    entries.insert(key, value);
                }
            }
        }
        Self { entries }
    }

    /// Decode a JSON document. Blank input and `null` yield an empty object;
    /// a scalar becomes a single entry at key `0`.
    pub fn from_json(json: &str) -> ObjectResult<Self> {
        Self::from_json_with_defaults(&ValueMap::new(), json)
    }

    pub fn from_json_with_defaults(defaults: &ValueMap, json: &str) -> ObjectResult<Self> {
        let json = json.trim();
        let input = if json.is_empty() {
            ValueMap::new()
        } else {
            match Value::from_json(json).map_err(|e| ObjectError::Serialization(e.to_string()))? {
                Value::Array(map) => map,
                Value::Null => ValueMap::new(),
                scalar => ValueMap::from_values([scalar]),
            }
        };
        Ok(Self::with_defaults(defaults, input))
    }

    /// The entry at `key`, or null.
    pub fn get(&self, key: impl Into<Key>) -> &Value {
        self.entries.get(&key.into()).unwrap_or(&NULL)
    }

    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.entries.remove(&key.into())
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.entries.contains_key(&key.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &ValueMap {
        &self.entries
    }

    pub fn to_json(&self) -> ObjectResult<String> {
        serde_json::to_string(&self.entries).map_err(|e| ObjectError::Serialization(e.to_string()))
    }
}

impl PropertyAccess for JsonObject {
    fn get(&self, field: &str) -> ObjectResult<Value> {
        Ok(JsonObject::get(self, field).clone())
    }

    fn set(&mut self, field: &str, value: Value) -> ObjectResult<()> {
        self.insert(field, value);
        Ok(())
    }
}

impl Serialize for JsonObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl fmt::Display for JsonObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_object() {
        let obj = JsonObject::from_json(r#"{"name":"ada","age":36}"#).unwrap();
        assert_eq!(obj.get("name"), &Value::from("ada"));
        assert_eq!(obj.get("age"), &Value::Int(36));
        assert_eq!(obj.get("missing"), &Value::Null);
    }

    #[test]
    fn display_is_json() {
        let obj = JsonObject::from_json(r#"{"a":1,"b":[1,2]}"#).unwrap();
        assert_eq!(obj.to_string(), r#"{"a":1,"b":[1,2]}"#);
        assert_eq!(JsonObject::new().to_string(), "[]");
    }

    #[test]
    fn defaults_are_overridden_by_input() {
        let mut defaults = ValueMap::new();
        defaults.insert("status", "draft");
        defaults.insert("tags", Value::from(Vec::<Value>::new()));
        let obj = JsonObject::from_json_with_defaults(&defaults, r#"{"status":"live"}"#).unwrap();
        assert_eq!(obj.get("status"), &Value::from("live"));
        assert!(obj.contains_key("tags"));
        let keys: Vec<_> = obj.entries().keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("status"), Key::from("tags")]);
    }

    #[test]
    fn integer_keys_are_appended_and_renumbered() {
        let defaults = ValueMap::from_values(["a"]);
        let obj = JsonObject::from_json_with_defaults(&defaults, r#"{"5":"b"}"#).unwrap();
        assert_eq!(obj.get(0), &Value::from("a"));
        assert_eq!(obj.get(1), &Value::from("b"));
        assert!(!obj.contains_key(5));
    }

    #[test]
    fn scalars_and_blank_input() {
        assert!(JsonObject::from_json("").unwrap().is_empty());
        assert!(JsonObject::from_json("null").unwrap().is_empty());
        let obj = JsonObject::from_json("7").unwrap();
        assert_eq!(obj.get(0), &Value::Int(7));
        assert!(matches!(
            JsonObject::from_json("{bad"),
            Err(ObjectError::Serialization(_))
        ));
    }

    #[test]
    fn property_access() {
        let mut obj = JsonObject::new();
        PropertyAccess::set(&mut obj, "title", Value::from("x")).unwrap();
        assert_eq!(PropertyAccess::get(&obj, "title").unwrap(), Value::from("x"));
        assert_eq!(PropertyAccess::get(&obj, "nothing").unwrap(), Value::Null);
        assert_eq!(obj.remove("title"), Some(Value::from("x")));
    }
}
