use arbor_types::{Key, Value, ValueMap};

use crate::collection::TypedCollection;
use crate::error::{CollectionError, CollectionResult};

/// Borrowed input to batch operations (`add_all`, `contains_all`, `equals`,
/// `remove_all`, `retain_all`) and to collection construction.
#[derive(Clone, Copy, Debug)]
pub enum Items<'a> {
    /// A plain 0-based sequence.
    Values(&'a [Value]),
    /// An ordered mapping. List-like maps are treated as sequences.
    Map(&'a ValueMap),
    /// Another collection. Always treated as a keyed mapping.
    Collection(&'a TypedCollection),
    /// An arbitrary value. Only arrays are iterable.
    Value(&'a Value),
}

/// How a batch is fed into a collection.
pub(crate) enum Batch<'a> {
    List(Vec<&'a Value>),
    Keyed(Vec<(&'a Key, &'a Value)>),
}

impl<'a> Items<'a> {
    pub(crate) fn batch(self, operation: &'static str) -> CollectionResult<Batch<'a>> {
        match self {
            Items::Values(values) => Ok(Batch::List(values.iter().collect())),
            Items::Map(map) | Items::Value(Value::Array(map)) => Ok(map_batch(map)),
            Items::Collection(c) => Ok(Batch::Keyed(c.iter().collect())),
            Items::Value(other) => Err(not_iterable(operation, other)),
        }
    }

    /// The element values. A non-array value counts as a single element.
    pub(crate) fn values(self) -> Vec<&'a Value> {
        match self {
            Items::Values(values) => values.iter().collect(),
            Items::Map(map) | Items::Value(Value::Array(map)) => map.values().collect(),
            Items::Collection(c) => c.values().collect(),
            Items::Value(value) => vec![value],
        }
    }

    /// The element values, rejecting anything that is not iterable.
    pub(crate) fn try_values(self, operation: &'static str) -> CollectionResult<Vec<&'a Value>> {
        match self {
            Items::Value(value) if !matches!(value, Value::Array(_)) => {
                Err(not_iterable(operation, value))
            }
            items => Ok(items.values()),
        }
    }

    /// Copy into an owned map, for adoption without validation.
    pub(crate) fn to_map(self, operation: &'static str) -> CollectionResult<ValueMap> {
        match self {
            Items::Values(values) => Ok(ValueMap::from_values(values.iter().cloned())),
            Items::Map(map) | Items::Value(Value::Array(map)) => Ok(map.clone()),
            Items::Collection(c) => Ok(c.to_array()),
            Items::Value(Value::Null) => Ok(ValueMap::new()),
            Items::Value(other) => Err(not_iterable(operation, other)),
        }
    }
}

fn map_batch(map: &ValueMap) -> Batch<'_> {
    if map.is_list() {
        Batch::List(map.values().collect())
    } else {
        Batch::Keyed(map.iter().collect())
    }
}

fn not_iterable(operation: &'static str, value: &Value) -> CollectionError {
    CollectionError::Type {
        operation,
        found: value.describe().to_string(),
    }
}

impl<'a> From<&'a [Value]> for Items<'a> {
    fn from(values: &'a [Value]) -> Self {
        Items::Values(values)
    }
}

impl<'a, const N: usize> From<&'a [Value; N]> for Items<'a> {
    fn from(values: &'a [Value; N]) -> Self {
        Items::Values(values)
    }
}

impl<'a> From<&'a Vec<Value>> for Items<'a> {
    fn from(values: &'a Vec<Value>) -> Self {
        Items::Values(values)
    }
}

impl<'a> From<&'a ValueMap> for Items<'a> {
    fn from(map: &'a ValueMap) -> Self {
        Items::Map(map)
    }
}

impl<'a> From<&'a TypedCollection> for Items<'a> {
    fn from(collection: &'a TypedCollection) -> Self {
        Items::Collection(collection)
    }
}

impl<'a> From<&'a Value> for Items<'a> {
    fn from(value: &'a Value) -> Self {
        Items::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_like_maps_are_sequences() {
        let map = ValueMap::from_values(["a", "b"]);
        assert!(matches!(Items::from(&map).batch("t"), Ok(Batch::List(v)) if v.len() == 2));
    }

    #[test]
    fn keyed_maps_are_keyed() {
        let mut map = ValueMap::new();
        map.insert("k", 1);
        assert!(matches!(Items::from(&map).batch("t"), Ok(Batch::Keyed(_))));
    }

    #[test]
    fn collections_are_always_keyed() {
        let c = TypedCollection::from_items(&[Value::from("a")], Default::default()).unwrap();
        assert!(matches!(Items::from(&c).batch("t"), Ok(Batch::Keyed(_))));
    }

    #[test]
    fn scalars_are_not_iterable() {
        let v = Value::Int(3);
        assert!(matches!(
            Items::from(&v).batch("add_all"),
            Err(CollectionError::Type { operation: "add_all", .. })
        ));
        assert!(Items::from(&v).try_values("retain_all").is_err());
        assert_eq!(Items::from(&v).values(), vec![&v]);
    }
}
