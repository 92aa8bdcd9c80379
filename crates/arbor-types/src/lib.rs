//! Foundation value types for Arbor.
//!
//! Every other Arbor crate stores and exchanges data through the types defined
//! here. Values are dynamically typed but the set of kinds is closed, so type
//! constraints are checked by pattern matching rather than by name lookups.
//!
//! # Key Types
//!
//! - [`Value`] -- A dynamically typed value (null, scalars, arrays, records)
//! - [`Key`] -- An integer or string key into a [`ValueMap`]
//! - [`ValueMap`] -- Ordered keyed map with list-style append semantics
//! - [`Record`] -- An object instance carrying a class name and lineage
//! - [`TypeTag`] -- Closed set of type descriptors used for element constraints
//! - [`Timestamp`] -- UTC instant with a configurable string format

pub mod datetime;
pub mod error;
pub mod key;
pub mod map;
pub mod record;
pub mod type_tag;
pub mod value;

pub use datetime::Timestamp;
pub use error::{TypeError, TypeResult};
pub use key::Key;
pub use map::ValueMap;
pub use record::Record;
pub use type_tag::TypeTag;
pub use value::Value;
