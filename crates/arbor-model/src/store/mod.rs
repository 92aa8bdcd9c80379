//! Document storage behind the [`DocumentStore`] trait.

pub mod memory;
pub mod query;
pub mod traits;

pub use memory::InMemoryDocumentStore;
pub use query::{compare_values, Document, Query, SortOrder};
pub use traits::{DocumentStore, DEFAULT_KEY_FIELD};
