//! Error types for property access.

use thiserror::Error;

/// Errors from reading or writing object properties.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// The property is neither declared, stored nor handled by an accessor,
    /// and the object is strict.
    #[error("undefined property {class}::${name}")]
    Undefined { class: String, name: String },

    /// The name refers to internal object state.
    #[error("cannot access internal property {class}::${name}")]
    Inaccessible { class: String, name: String },

    /// A custom accessor refused the value.
    #[error("property {name} rejected: {reason}")]
    Rejected { name: String, reason: String },

    /// A JSON payload could not be decoded or encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for property access results.
pub type ObjectResult<T> = Result<T, ObjectError>;
