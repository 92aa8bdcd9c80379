use arbor_types::TypeTag;
use serde::{Deserialize, Serialize};

use crate::error::{CollectionError, CollectionResult};

/// Constraints enforced by a [`TypedCollection`](crate::TypedCollection).
///
/// ```toml
/// element_type = "integer"
/// capacity = 3
/// key_required = false
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Type every non-null element must satisfy. `None` accepts anything.
    pub element_type: Option<TypeTag>,
    /// Maximum number of entries. `None` means unbounded.
    pub capacity: Option<usize>,
    /// When `true`, every insert must name its key.
    pub key_required: bool,
}

impl CollectionConfig {
    /// Elements restricted to `element_type`.
    pub fn typed(element_type: TypeTag) -> Self {
        Self {
            element_type: Some(element_type),
            ..Default::default()
        }
    }

    /// At most `capacity` entries.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Default::default()
        }
    }

    /// Every insert must supply a key.
    pub fn keyed() -> Self {
        Self {
            key_required: true,
            ..Default::default()
        }
    }

    pub fn with_element_type(mut self, element_type: TypeTag) -> Self {
        self.element_type = Some(element_type);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_key_required(mut self, key_required: bool) -> Self {
        self.key_required = key_required;
        self
    }

    /// Load from a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> CollectionResult<Self> {
        toml::from_str(s).map_err(|e| CollectionError::Serialization(e.to_string()))
    }
}
