use std::fmt;
use std::ops::{Deref, DerefMut};

use arbor_types::{Value, ValueMap};

use crate::collection::TypedCollection;
use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::items::Items;

/// A [`TypedCollection`] seeded from and rendered as JSON.
///
/// Everything except construction and `Display` is the plain collection
/// behavior, reached through `Deref`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonCollection(TypedCollection);

impl JsonCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `json` and seed a collection from it.
    ///
    /// Arrays become list-like entries, objects keyed entries. Blank input and
    /// `null` yield an empty collection; a JSON scalar is rejected.
    pub fn from_json(json: &str, config: CollectionConfig) -> CollectionResult<Self> {
        let json = json.trim();
        let initial = if json.is_empty() {
            ValueMap::new()
        } else {
            match Value::from_json(json)
                .map_err(|e| CollectionError::Serialization(e.to_string()))?
            {
                Value::Array(map) => map,
                Value::Null => ValueMap::new(),
                other => {
                    return Err(CollectionError::Serialization(format!(
                        "expected a JSON array or object, found {}",
                        other.type_name()
                    )))
                }
            }
        };
        Self::from_items(&initial, config)
    }

    pub fn from_items<'a>(
        initial: impl Into<Items<'a>>,
        config: CollectionConfig,
    ) -> CollectionResult<Self> {
        TypedCollection::from_items(initial, config).map(Self)
    }

    /// The full ordered mapping as JSON.
    pub fn to_json(&self) -> CollectionResult<String> {
        serde_json::to_string(&self.0).map_err(|e| CollectionError::Serialization(e.to_string()))
    }

    pub fn into_inner(self) -> TypedCollection {
        self.0
    }
}

impl From<TypedCollection> for JsonCollection {
    fn from(collection: TypedCollection) -> Self {
        Self(collection)
    }
}

impl Deref for JsonCollection {
    type Target = TypedCollection;

    fn deref(&self) -> &TypedCollection {
        &self.0
    }
}

impl DerefMut for JsonCollection {
    fn deref_mut(&mut self) -> &mut TypedCollection {
        &mut self.0
    }
}

impl fmt::Display for JsonCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
