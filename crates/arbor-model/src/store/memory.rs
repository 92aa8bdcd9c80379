use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use arbor_types::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::query::{compare_values, Document, Query, SortOrder};
use crate::store::traits::DocumentStore;

type Collections = HashMap<String, Vec<Document>>;

/// In-memory, HashMap-based document store.
///
/// Intended for tests and embedding. Every collection is a vector of
/// documents behind one `RwLock`; documents are cloned on read and write.
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Load a store from the JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let collections: Collections =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    /// Snapshot every collection as a JSON object keyed by collection name.
    pub fn to_json(&self) -> StoreResult<String> {
        let map = self.read()?;
        let sorted: BTreeMap<&String, &Vec<Document>> = map.iter().collect();
        serde_json::to_string(&sorted).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.read()?.get(collection).map_or(0, Vec::len))
    }

    /// Returns `true` if no collection holds a document.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.values().all(Vec::is_empty))
    }

    /// Sorted names of all collections.
    pub fn collections(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Remove every document.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject filters using query operators.
fn check_filter(filter: &Document) -> StoreResult<()> {
    match filter.keys().find(|k| k.starts_with('$')) {
        Some(op) => Err(StoreError::InvalidFilter(format!("unsupported operator {op}"))),
        None => Ok(()),
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field).unwrap_or(&Value::Null) == expected)
}

fn key_of<'a>(document: &'a Document, key_field: &str) -> Option<&'a Value> {
    document.get(key_field).filter(|v| !v.is_null())
}

fn project(document: &Document, fields: &[String]) -> Document {
    if fields.is_empty() {
        return document.clone();
    }
    fields
        .iter()
        .filter_map(|f| document.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

impl DocumentStore for InMemoryDocumentStore {
    fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        check_filter(&query.filter)?;
        let map = self.read()?;
        let Some(documents) = map.get(collection) else {
            return Ok(Vec::new());
        };
        let mut found: Vec<&Document> =
            documents.iter().filter(|d| matches(d, &query.filter)).collect();
        if !query.sort.is_empty() {
            found.sort_by(|a, b| {
                query
                    .sort
                    .iter()
                    .map(|(field, order)| {
                        let ord = compare_values(
                            a.get(field).unwrap_or(&Value::Null),
                            b.get(field).unwrap_or(&Value::Null),
                        );
                        match order {
                            SortOrder::Asc => ord,
                            SortOrder::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(found.into_iter().take(limit).map(|d| project(d, &query.fields)).collect())
    }

    fn count(&self, collection: &str, filter: &Document) -> StoreResult<usize> {
        check_filter(filter)?;
        let map = self.read()?;
        Ok(map
            .get(collection)
            .map_or(0, |docs| docs.iter().filter(|d| matches(d, filter)).count()))
    }

    fn insert(&self, collection: &str, key_field: &str, document: Document) -> StoreResult<()> {
        let mut map = self.write()?;
        let documents = map.entry(collection.to_string()).or_default();
        if let Some(key) = key_of(&document, key_field) {
            if documents.iter().any(|d| key_of(d, key_field) == Some(key)) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    key: key.to_string(),
                });
            }
        }
        debug!(collection, "document inserted");
        documents.push(document);
        Ok(())
    }

    fn save(&self, collection: &str, key_field: &str, document: Document) -> StoreResult<()> {
        let mut map = self.write()?;
        let documents = map.entry(collection.to_string()).or_default();
        let existing = key_of(&document, key_field)
            .and_then(|key| documents.iter().position(|d| key_of(d, key_field) == Some(key)));
        match existing {
            Some(index) => {
                debug!(collection, "document replaced");
                documents[index] = document;
            }
            None => {
                debug!(collection, "document inserted");
                documents.push(document);
            }
        }
        Ok(())
    }

    fn update(&self, collection: &str, filter: &Document, document: Document) -> StoreResult<bool> {
        check_filter(filter)?;
        let mut map = self.write()?;
        let Some(slot) = map
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, filter)))
        else {
            return Ok(false);
        };
        *slot = document;
        debug!(collection, "document updated");
        Ok(true)
    }

    fn remove(&self, collection: &str, filter: &Document) -> StoreResult<bool> {
        check_filter(filter)?;
        let mut map = self.write()?;
        let Some(documents) = map.get_mut(collection) else {
            return Ok(false);
        };
        match documents.iter().position(|d| matches(d, filter)) {
            Some(index) => {
                documents.remove(index);
                debug!(collection, "document removed");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.collections().unwrap_or_default();
        f.debug_struct("InMemoryDocumentStore")
            .field("collections", &collections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::DocRef;
    use crate::store::traits::DEFAULT_KEY_FIELD;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        for (id, name, age) in [("a", "ada", 36), ("b", "bob", 25), ("c", "cy", 41)] {
            store
                .insert(
                    "users",
                    DEFAULT_KEY_FIELD,
                    doc(&[
                        ("_id", Value::from(id)),
                        ("name", Value::from(name)),
                        ("age", Value::Int(age)),
                    ]),
                )
                .unwrap();
        }
        store
    }

    // -----------------------------------------------------------------------
    // Insert / save
    // -----------------------------------------------------------------------

    #[test]
    fn insert_rejects_duplicate_keys() {
        let store = seeded();
        let err = store
            .insert("users", "_id", doc(&[("_id", Value::from("a"))]))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateKey {
                collection: "users".into(),
                key: "a".into(),
            }
        );
        assert_eq!(store.len("users").unwrap(), 3);
    }

    #[test]
    fn insert_without_key_is_allowed() {
        let store = InMemoryDocumentStore::new();
        store.insert("logs", "_id", doc(&[("msg", Value::from("x"))])).unwrap();
        store.insert("logs", "_id", doc(&[("msg", Value::from("x"))])).unwrap();
        assert_eq!(store.len("logs").unwrap(), 2);
    }

    #[test]
    fn save_upserts_by_key() {
        let store = seeded();
        store
            .save(
                "users",
                "_id",
                doc(&[("_id", Value::from("a")), ("name", Value::from("ada l."))]),
            )
            .unwrap();
        store.save("users", "_id", doc(&[("_id", Value::from("d"))])).unwrap();
        assert_eq!(store.len("users").unwrap(), 4);
        let ada = store.get("users", "_id", &Value::from("a")).unwrap();
        assert_eq!(ada["name"], Value::from("ada l."));
        assert!(!ada.contains_key("age"));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[test]
    fn find_filters_sorts_projects_and_limits() {
        let store = seeded();
        let query = Query::new().sort_by("age", SortOrder::Desc).project(&["name"]).limit(2);
        let found = store.find("users", &query).unwrap();
        let names: Vec<_> = found.iter().map(|d| d["name"].clone()).collect();
        assert_eq!(names, vec![Value::from("cy"), Value::from("ada")]);
        assert_eq!(found[0].len(), 1);

        let found = store.find("users", &Query::new().where_eq("age", 25)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["_id"], Value::from("b"));
    }

    #[test]
    fn null_filter_matches_missing_field() {
        let store = seeded();
        let filter = doc(&[("email", Value::Null)]);
        assert_eq!(store.count("users", &filter).unwrap(), 3);
        assert_eq!(store.count("nobody", &filter).unwrap(), 0);
    }

    #[test]
    fn operators_are_rejected() {
        let store = seeded();
        let filter = doc(&[("$or", Value::Null)]);
        assert!(matches!(store.count("users", &filter), Err(StoreError::InvalidFilter(_))));
        assert!(matches!(store.remove("users", &filter), Err(StoreError::InvalidFilter(_))));
    }

    #[test]
    fn get_reports_missing_documents() {
        let store = seeded();
        let err = store.get("users", "_id", &Value::from("zz")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn dereference_uses_default_key() {
        let store = seeded();
        let target = store.dereference(&DocRef::new("users", "c")).unwrap().unwrap();
        assert_eq!(target["name"], Value::from("cy"));
        assert!(store.dereference(&DocRef::new("groups", "c")).unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Update / remove
    // -----------------------------------------------------------------------

    #[test]
    fn update_replaces_first_match_only() {
        let store = seeded();
        let filter = doc(&[("_id", Value::from("b"))]);
        let updated = store
            .update("users", &filter, doc(&[("_id", Value::from("b")), ("age", Value::Int(26))]))
            .unwrap();
        assert!(updated);
        assert_eq!(store.get("users", "_id", &Value::from("b")).unwrap()["age"], Value::Int(26));
        let missing = doc(&[("_id", Value::from("zz"))]);
        assert!(!store.update("users", &missing, Document::new()).unwrap());
        assert_eq!(store.len("users").unwrap(), 3);
    }

    #[test]
    fn remove_takes_one_document() {
        let store = seeded();
        store.insert("users", "_id", doc(&[("name", Value::from("ada"))])).unwrap();
        let filter = doc(&[("name", Value::from("ada"))]);
        assert!(store.remove("users", &filter).unwrap());
        assert_eq!(store.count("users", &filter).unwrap(), 1);
        assert!(!store.remove("groups", &filter).unwrap());
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn json_snapshot_roundtrip() {
        let store = seeded();
        let json = store.to_json().unwrap();
        let restored = InMemoryDocumentStore::from_json(&json).unwrap();
        assert_eq!(restored.collections().unwrap(), vec!["users".to_string()]);
        assert_eq!(
            restored.find("users", &Query::new()).unwrap(),
            store.find("users", &Query::new()).unwrap()
        );
        assert!(matches!(
            InMemoryDocumentStore::from_json("[1"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn clear_empties_everything() {
        let store = seeded();
        assert!(!store.is_empty().unwrap());
        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
        assert!(format!("{store:?}").contains("InMemoryDocumentStore"));
    }
}
