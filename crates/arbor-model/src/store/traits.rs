use arbor_types::Value;

use crate::error::{StoreError, StoreResult};
use crate::reference::DocRef;
use crate::store::query::{Document, Query};

/// Primary key name used by database references.
pub const DEFAULT_KEY_FIELD: &str = "_id";

/// Collection-oriented document store.
///
/// All implementations must satisfy these invariants:
/// - Filters are conjunctions of field equalities. A null filter value also
///   matches documents lacking the field.
/// - Within a collection, at most one document holds a given non-null
///   primary key value. `insert` never overwrites.
/// - Documents keep their field order.
/// - Errors are propagated, never silently ignored.
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching the query, in sort order.
    fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Number of documents in `collection` matching `filter`.
    fn count(&self, collection: &str, filter: &Document) -> StoreResult<usize>;

    /// Add a new document. Fails with [`StoreError::DuplicateKey`] if a
    /// document with the same `key_field` value exists.
    fn insert(&self, collection: &str, key_field: &str, document: Document) -> StoreResult<()>;

    /// Replace the document with the same `key_field` value, or add it.
    fn save(&self, collection: &str, key_field: &str, document: Document) -> StoreResult<()>;

    /// Replace the first document matching `filter`. Returns `true` if one
    /// matched; never inserts.
    fn update(&self, collection: &str, filter: &Document, document: Document) -> StoreResult<bool>;

    /// Remove the first document matching `filter`. Returns `true` if one
    /// was removed.
    fn remove(&self, collection: &str, filter: &Document) -> StoreResult<bool>;

    /// First document matching `filter`, if any.
    ///
    /// Default implementation runs [`find`](Self::find) with a limit of one.
    fn find_one(&self, collection: &str, filter: &Document) -> StoreResult<Option<Document>> {
        let query = Query::new().with_filter(filter.clone()).limit(1);
        Ok(self.find(collection, &query)?.into_iter().next())
    }

    /// Document whose `key_field` equals `id`.
    ///
    /// Returns [`StoreError::NotFound`] if there is none.
    fn get(&self, collection: &str, key_field: &str, id: &Value) -> StoreResult<Document> {
        let mut filter = Document::new();
        filter.insert(key_field.to_string(), id.clone());
        self.find_one(collection, &filter)?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                key: id.to_string(),
            })
    }

    /// Target of a database reference, looked up by [`DEFAULT_KEY_FIELD`].
    fn dereference(&self, reference: &DocRef) -> StoreResult<Option<Document>> {
        let mut filter = Document::new();
        filter.insert(DEFAULT_KEY_FIELD.to_string(), reference.id.clone());
        self.find_one(&reference.collection, &filter)
    }
}
