//! Typed, capacity-bounded collections for Arbor.
//!
//! A [`TypedCollection`] is an ordered keyed container of [`Value`]s that can
//! restrict its elements to a [`TypeTag`] and its size to a fixed capacity.
//! [`JsonCollection`] is the same container seeded from and rendered as JSON.
//!
//! # Rules
//!
//! 1. Non-null elements of a typed collection always satisfy its type.
//! 2. A bounded collection never holds more entries than its capacity.
//! 3. A failed single insert leaves the collection unchanged. Batch inserts
//!    are not atomic.
//! 4. Overwriting a key keeps its position; new keys are appended.
//!
//! [`Value`]: arbor_types::Value
//! [`TypeTag`]: arbor_types::TypeTag

pub mod collection;
pub mod config;
pub mod error;
pub mod items;
pub mod json;

pub use collection::TypedCollection;
pub use config::CollectionConfig;
pub use error::{CollectionError, CollectionResult};
pub use items::Items;
pub use json::JsonCollection;
