//! Document-backed models for Arbor.
//!
//! A [`Model`] is a dynamic object whose layout comes from a [`ModelConfig`]
//! and whose documents live in a [`DocumentStore`] collection. Models
//! validate themselves against named [`RuleSet`]s, fetch lazily, resolve
//! references to other documents and store dates as epoch seconds.
//!
//! # Key Types
//!
//! - [`Model`] -- persisted object with validation, fetching and references
//! - [`ModelConfig`] -- collection, primary key, fields and rule sets
//! - [`DocumentStore`] -- collection-oriented storage seam
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and embedding
//! - [`RuleSet`] / [`ValidationReport`] -- field rules and their outcome
//! - [`DocRef`] -- `{"$ref", "$id"}` document reference
//! - [`FetchHash`] -- BLAKE3 digest recorded after a successful fetch
//!
//! # Design Rules
//!
//! 1. A fetched model never touches the store again until invalidated.
//! 2. Validation failures and store errors are returned, never swallowed.
//! 3. `save` inserts first and only updates when the key already exists.

pub mod config;
pub mod error;
pub mod hash;
pub mod model;
pub mod reference;
pub mod store;
pub mod validation;

pub use config::{ModelConfig, FETCH_RULES, INSERT_RULES};
pub use error::{ModelError, ModelResult, StoreError, StoreResult};
pub use hash::{FetchHash, FetchHasher};
pub use model::Model;
pub use reference::{DocRef, RefKind};
pub use store::{DocumentStore, Document, InMemoryDocumentStore, Query, SortOrder};
pub use validation::{Rule, RuleSet, ValidationReport};
