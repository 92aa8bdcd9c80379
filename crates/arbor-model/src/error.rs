//! Error types for document stores and models.

use arbor_object::ObjectError;
use thiserror::Error;

use crate::validation::ValidationReport;

/// Errors from document store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No document matched.
    #[error("document not found in {collection}: {key}")]
    NotFound { collection: String, key: String },

    /// A document with the same primary key already exists.
    #[error("duplicate key in {collection}: {key}")]
    DuplicateKey { collection: String, key: String },

    /// The filter uses a construct the store does not support.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    /// The model failed the named rule set.
    #[error("failed to validate {rule_set}: {report}")]
    Validation {
        rule_set: String,
        report: ValidationReport,
    },

    /// No rule set with this name is configured.
    #[error("unknown validation rule set: {0}")]
    MissingRuleSet(String),

    /// A reference field holds or received something that is not a reference.
    #[error("invalid reference in {field}: {reason}")]
    InvalidReference { field: String, reason: String },

    /// Model configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
