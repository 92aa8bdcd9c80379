//! Objects with late-bound property access for Arbor.
//!
//! Fields are resolved by name at run time through the [`PropertyAccess`]
//! trait. A [`DynamicObject`] checks names against a shared [`Schema`], which
//! may reserve internal names and register custom getters and setters. A
//! [`JsonObject`] is a free-form map that reads missing entries as null.
//!
//! # Key Types
//!
//! - [`PropertyAccess`] -- read and write fields by name
//! - [`Schema`] -- declared fields, internal names and accessors of a class
//! - [`Mode`] -- strict or flexible handling of unknown fields
//! - [`DynamicObject`] -- schema-checked object
//! - [`JsonObject`] -- JSON-backed object merged over defaults

pub mod access;
pub mod error;
pub mod json;
pub mod object;
pub mod schema;

pub use access::PropertyAccess;
pub use error::{ObjectError, ObjectResult};
pub use json::JsonObject;
pub use object::{filter_input, DynamicObject, Selection};
pub use schema::{Getter, Mode, Properties, Schema, Setter};
