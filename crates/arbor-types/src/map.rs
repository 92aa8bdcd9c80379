//! Ordered keyed map of values.
//!
//! [`ValueMap`] keeps entries in insertion order. Overwriting an existing key
//! keeps its position; new keys are appended. List-style appends use the next
//! free integer key, which is one past the largest integer key present (or `0`),
//! regardless of any string keys in the map.

use std::fmt;

use indexmap::IndexMap;
use serde::de;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::key::Key;
use crate::value::Value;

/// Ordered `Key -> Value` map with list-style append semantics.
///
/// Equality is order-sensitive: two maps are equal when they hold the same
/// entries in the same order.
#[derive(Clone, Default)]
pub struct ValueMap(IndexMap<Key, Value>);

impl ValueMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Create a list-like map keyed `0..n` from the given values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::Int(index_key(i)), v.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or overwrite `key`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Append `value` under the next free integer key and return that key.
    ///
    /// Returns `None`, leaving the map unchanged, when the largest integer key
    /// is `i64::MAX`.
    pub fn push(&mut self, value: impl Into<Value>) -> Option<Key> {
        let key = Key::Int(self.next_index()?);
        self.0.insert(key.clone(), value.into());
        Some(key)
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// The key [`push`](Self::push) would use next, or `None` once `i64::MAX`
    /// is taken.
    pub fn next_index(&self) -> Option<i64> {
        match self.0.keys().filter_map(Key::as_int).max() {
            Some(max) => max.checked_add(1).map(|next| next.max(0)),
            None => Some(0),
        }
    }

    /// Returns `true` when the keys are exactly `0..len` in order.
    pub fn is_list(&self) -> bool {
        self.0
            .keys()
            .enumerate()
            .all(|(i, k)| *k == Key::Int(index_key(i)))
    }

    /// Renumber integer keys `0..` in iteration order. String keys are kept.
    pub fn renumber(&mut self) {
        let mut next = 0i64;
        let entries = std::mem::take(&mut self.0);
        self.0 = entries
            .into_iter()
            .map(|(k, v)| match k {
                Key::Int(_) => {
                    let key = Key::Int(next);
                    next += 1;
                    (key, v)
                }
                key @ Key::Str(_) => (key, v),
            })
            .collect();
    }

    /// Key of the first entry whose value equals `value`.
    pub fn key_of(&self, value: &Value) -> Option<&Key> {
        self.0.iter().find(|(_, v)| *v == value).map(|(k, _)| k)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.0.values()
    }
}

fn index_key(i: usize) -> i64 {
    i64::try_from(i).unwrap_or(i64::MAX)
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl FromIterator<(Key, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ValueMap {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<Value>> for ValueMap {
    fn from(values: Vec<Value>) -> Self {
        Self::from_values(values)
    }
}

impl Serialize for ValueMap {
    /// List-like maps serialize as sequences, everything else as a map.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for value in self.values() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

impl<'de> Deserialize<'de> for ValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(map) => Ok(map),
            Value::Null => Ok(ValueMap::new()),
            other => Err(de::Error::invalid_type(
                de::Unexpected::Other(other.type_name()),
                &"a sequence or a map",
            )),
        }
    }
}
