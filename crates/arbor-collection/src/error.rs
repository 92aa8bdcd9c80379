//! Error types for collection operations.

/// Errors from collection operations.
///
/// Every failing operation leaves the collection exactly as it was before the
/// call. Batch operations are the exception: entries committed before the
/// failing element stay in place.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollectionError {
    /// The call does not satisfy the collection's configuration (for example
    /// a keyless insert into a collection that requires keys).
    #[error("{0}")]
    Configuration(String),

    /// The value does not conform to the collection's element type.
    #[error("invalid argument type, expecting {expected} and found {found}")]
    InvalidArgument { expected: String, found: String },

    /// Inserting would grow the collection beyond its capacity.
    #[error("attempting to access an item beyond the capacity of the collection: {capacity}")]
    CapacityExceeded { capacity: usize },

    /// A keyless insert found the next integer key already occupied.
    #[error("cannot append: the next element is already occupied")]
    IndexExhausted,

    /// A batch operation was given something that is neither a sequence nor
    /// a mapping.
    #[error("{operation} expects a sequence or a mapping, {found} given")]
    Type {
        operation: &'static str,
        found: String,
    },

    /// A JSON payload or configuration document could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;
