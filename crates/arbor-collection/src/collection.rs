//! The typed collection: an ordered keyed container with optional element
//! type and capacity constraints.
//!
//! Entries live in a [`ValueMap`], so insertion order is preserved, overwrites
//! keep their position and keyless appends take the next free integer key.
//! Every single-entry insert is checked before anything is written: a failed
//! insert never changes the collection.

use std::fmt;
use std::ops::Index;

use arbor_types::{Key, TypeTag, Value, ValueMap};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::items::{Batch, Items};

/// An ordered keyed container enforcing an optional element type and an
/// optional maximum size.
///
/// Besides its entries a collection carries free-form *attributes*: named
/// values attached to the collection itself. They take part in
/// [`equals`](Self::equals) but are otherwise untouched by collection
/// operations.
#[derive(Clone, Debug, Default)]
pub struct TypedCollection {
    elements: ValueMap,
    config: CollectionConfig,
    attributes: IndexMap<String, Value>,
}

impl TypedCollection {
    /// An empty, unconstrained collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty collection with the given constraints.
    pub fn with_config(config: CollectionConfig) -> Self {
        Self {
            elements: ValueMap::new(),
            config,
            attributes: IndexMap::new(),
        }
    }

    /// A collection seeded from `initial`.
    ///
    /// With an element type configured, the collection starts empty and every
    /// initial entry goes through [`add_all`](Self::add_all), so invalid seeds
    /// fail exactly like later inserts. Without one, `initial` is adopted as
    /// is.
    pub fn from_items<'a>(
        initial: impl Into<Items<'a>>,
        config: CollectionConfig,
    ) -> CollectionResult<Self> {
        let initial = initial.into();
        let mut collection = Self::with_config(config);
        if collection.config.element_type.is_some() {
            collection.add_all(initial)?;
        } else {
            collection.elements = initial.to_map("from_items")?;
        }
        Ok(collection)
    }

    // ---------------------------------------------------------------
    // Inserts
    // ---------------------------------------------------------------

    /// Append `value` under the next free integer key.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::Configuration`] if the collection requires keys.
    /// - [`CollectionError::InvalidArgument`] if `value` is non-null and does
    ///   not conform to the element type.
    /// - [`CollectionError::CapacityExceeded`] if the collection is full.
    /// - [`CollectionError::IndexExhausted`] if the next integer key is
    ///   already occupied.
    pub fn add(&mut self, value: impl Into<Value>) -> CollectionResult<bool> {
        if self.config.key_required {
            return Err(CollectionError::Configuration(
                "add requires both a key and a value".into(),
            ));
        }
        let value = value.into();
        self.check_type(&value)?;
        if let Some(capacity) = self.config.capacity {
            if self.elements.len() >= capacity {
                return Err(self.capacity_exceeded(capacity));
            }
        }
        let key = self
            .elements
            .push(value)
            .ok_or(CollectionError::IndexExhausted)?;
        trace!(%key, "appended collection element");
        Ok(true)
    }

    /// Insert `value` at `key`, overwriting any existing entry in place.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidArgument`] if `value` is non-null and does
    ///   not conform to the element type.
    /// - [`CollectionError::CapacityExceeded`] if `key` is an integer at or
    ///   beyond the capacity, or if `key` is new while the collection is full.
    pub fn add_keyed(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> CollectionResult<bool> {
        let key = key.into();
        let value = value.into();
        self.check_type(&value)?;
        self.check_capacity_for(&key)?;
        trace!(%key, "inserted collection element");
        self.elements.insert(key, value);
        Ok(true)
    }

    /// Insert every entry of `items`.
    ///
    /// Plain 0-based sequences are appended through [`add`](Self::add); any
    /// other mapping, including another collection, is inserted pair by pair
    /// through [`add_keyed`](Self::add_keyed).
    ///
    /// The batch is not atomic: entries inserted before a failing element
    /// remain in the collection.
    pub fn add_all<'a>(&mut self, items: impl Into<Items<'a>>) -> CollectionResult<bool> {
        match items.into().batch("add_all")? {
            Batch::List(values) => {
                if self.config.key_required {
                    return Err(CollectionError::Configuration(
                        "add_all requires items to be keyed".into(),
                    ));
                }
                for value in values {
                    self.add(value.clone())?;
                }
            }
            Batch::Keyed(entries) => {
                for (key, value) in entries {
                    self.add_keyed(key.clone(), value.clone())?;
                }
            }
        }
        Ok(true)
    }

    fn check_type(&self, value: &Value) -> CollectionResult<()> {
        match &self.config.element_type {
            Some(tag) if !value.is_null() && !tag.matches(value) => {
                debug!(expected = %tag, found = value.describe(), "rejected collection element");
                Err(CollectionError::InvalidArgument {
                    expected: tag.to_string(),
                    found: value.describe().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_capacity_for(&self, key: &Key) -> CollectionResult<()> {
        let Some(capacity) = self.config.capacity else {
            return Ok(());
        };
        let is_new = !self.elements.contains_key(key);
        let beyond = key.numeric_value().is_some_and(|n| n >= capacity as f64);
        if beyond || (is_new && self.elements.len() >= capacity) {
            return Err(self.capacity_exceeded(capacity));
        }
        Ok(())
    }

    fn capacity_exceeded(&self, capacity: usize) -> CollectionError {
        debug!(capacity, size = self.elements.len(), "rejected insert beyond capacity");
        CollectionError::CapacityExceeded { capacity }
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Returns `true` if some entry's value equals `item`.
    pub fn contains(&self, item: &Value) -> bool {
        self.elements.values().any(|v| v == item)
    }

    /// Returns `true` if every element of `items` is present as a value.
    pub fn contains_all<'a>(&self, items: impl Into<Items<'a>>) -> bool {
        items.into().values().into_iter().all(|v| self.contains(v))
    }

    /// Returns `true` if `other` is a collection with the same ordered values
    /// and the same attributes. Raw sequences and mappings never compare
    /// equal to a collection.
    pub fn equals<'a>(&self, other: impl Into<Items<'a>>) -> bool {
        match other.into() {
            Items::Collection(other) => {
                self.elements.values().eq(other.elements.values())
                    && self.attributes == other.attributes
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.elements.get(&key.into())
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.elements.contains_key(&key.into())
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.elements.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.elements.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.elements.values()
    }

    /// A shallow snapshot of the entries.
    pub fn to_array(&self) -> ValueMap {
        self.elements.clone()
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn element_type(&self) -> Option<&TypeTag> {
        self.config.element_type.as_ref()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.config.capacity
    }

    pub fn key_required(&self) -> bool {
        self.config.key_required
    }

    // ---------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------

    /// Remove every entry. Attributes are kept.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Remove the first entry whose value equals `item`.
    pub fn remove(&mut self, item: &Value) -> bool {
        match self.elements.key_of(item).cloned() {
            Some(key) => self.remove_at(key),
            None => false,
        }
    }

    /// Remove the entry at `key`.
    ///
    /// String keys, numeric-looking ones such as `"1.5"` included, are deleted
    /// directly. Integer keys are spliced out: the
    /// remaining integer-keyed entries are renumbered `0..` in iteration
    /// order, so in a `0..n` list every key after the removed one shifts down
    /// by one. Always returns `true`.
    pub fn remove_at(&mut self, key: impl Into<Key>) -> bool {
        let key = key.into();
        self.elements.remove(&key);
        if key.is_int() {
            self.elements.renumber();
        }
        trace!(%key, "removed collection element");
        true
    }

    /// Remove one occurrence of every element of `items`. Returns `true` if
    /// anything was removed.
    pub fn remove_all<'a>(&mut self, items: impl Into<Items<'a>>) -> bool {
        let mut affected = false;
        for item in items.into().values() {
            affected |= self.remove(item);
        }
        affected
    }

    /// Remove every entry whose value is not present in `items`. Returns
    /// `true` if anything was removed.
    pub fn retain_all<'a>(&mut self, items: impl Into<Items<'a>>) -> CollectionResult<bool> {
        let keep = items.into().try_values("retain_all")?;
        let doomed: Vec<Value> = self
            .elements
            .values()
            .filter(|v| !keep.iter().any(|k| k == v))
            .cloned()
            .collect();
        let mut affected = false;
        for item in &doomed {
            affected |= self.remove(item);
        }
        Ok(affected)
    }

    // ---------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.attributes.insert(name.into(), value.into())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.shift_remove(name)
    }
}

impl PartialEq for TypedCollection {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<K: Into<Key>> Index<K> for TypedCollection {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: K) -> &Value {
        let key = key.into();
        match self.elements.get(&key) {
            Some(value) => value,
            None => panic!("no collection entry for key {key:?}"),
        }
    }
}

impl<'a> IntoIterator for &'a TypedCollection {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for TypedCollection {
    /// Values joined by a single space.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.elements.values().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl Serialize for TypedCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.elements.serialize(serializer)
    }
}

impl From<TypedCollection> for Value {
    fn from(collection: TypedCollection) -> Self {
        Value::Array(collection.elements)
    }
}
