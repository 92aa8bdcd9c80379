use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arbor_object::{
    filter_input, DynamicObject, ObjectError, ObjectResult, Properties, PropertyAccess, Selection,
};
use arbor_types::{Key, Timestamp, TypeResult, Value, ValueMap};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{ModelConfig, FETCH_RULES, INSERT_RULES};
use crate::error::{ModelError, ModelResult, StoreError};
use crate::hash::{FetchHash, FetchHasher};
use crate::reference::{DocRef, RefKind};
use crate::store::{Document, DocumentStore, Query};
use crate::validation::{RuleSet, ValidationReport};

/// Read-only accessor exposing the last validation messages.
pub const ERRORS_FIELD: &str = "errors";
/// Alias of the configured primary key.
pub const ID_FIELD: &str = "id";

fn to_value_map(properties: Properties) -> ValueMap {
    properties.into_iter().map(|(k, v)| (Key::from(k), v)).collect()
}

fn rejected(name: &str, reason: impl Into<String>) -> ObjectError {
    ObjectError::Rejected {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// A document-backed object.
///
/// Properties are laid out by a [`ModelConfig`] and persisted in a
/// [`DocumentStore`] collection. Besides plain fields a model knows:
///
/// - `id`, an alias of the primary key;
/// - `errors`, the messages of the last validation;
/// - date fields, stored as epoch seconds and read as ISO-8601 strings;
/// - reference fields, read by dereferencing through the store.
///
/// Fetching is lazy: once a fetch succeeds its hash is kept and further
/// fetches return `true` without touching the store until
/// [`invalidate`](Self::invalidate) is called.
#[derive(Clone)]
pub struct Model {
    config: Arc<ModelConfig>,
    store: Arc<dyn DocumentStore>,
    object: DynamicObject,
    fetch_hash: Option<FetchHash>,
    validation: Option<ValidationReport>,
    dereferences: HashMap<String, Model>,
}

impl Model {
    /// An empty model with every declared field null.
    pub fn new(config: Arc<ModelConfig>, store: Arc<dyn DocumentStore>) -> Self {
        let object = DynamicObject::new(Arc::new(config.schema()), config.mode);
        Self {
            config,
            store,
            object,
            fetch_hash: None,
            validation: None,
            dereferences: HashMap::new(),
        }
    }

    /// A model with `properties` assigned in order.
    pub fn with_properties<I, K, V>(
        config: Arc<ModelConfig>,
        store: Arc<dyn DocumentStore>,
        properties: I,
    ) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut model = Self::new(config, store);
        model.set_properties(properties)?;
        Ok(model)
    }

    /// The document whose primary key is `id`.
    pub fn load(
        config: Arc<ModelConfig>,
        store: Arc<dyn DocumentStore>,
        id: impl Into<Value>,
    ) -> ModelResult<Self> {
        let document = store.get(&config.collection, &config.primary_key, &id.into())?;
        Self::from_fetched(config, store, document)
    }

    /// Models for every document matching `query`, each marked as fetched.
    pub fn fetch_list(
        config: &Arc<ModelConfig>,
        store: &Arc<dyn DocumentStore>,
        query: &Query,
    ) -> ModelResult<Vec<Self>> {
        store
            .find(&config.collection, query)?
            .into_iter()
            .map(|document| Self::from_fetched(Arc::clone(config), Arc::clone(store), document))
            .collect()
    }

    /// Number of documents matching `filter`.
    pub fn count(
        config: &ModelConfig,
        store: &dyn DocumentStore,
        filter: &Document,
    ) -> ModelResult<usize> {
        Ok(store.count(&config.collection, filter)?)
    }

    fn from_fetched(
        config: Arc<ModelConfig>,
        store: Arc<dyn DocumentStore>,
        document: Document,
    ) -> ModelResult<Self> {
        let mut model = Self::new(config, store);
        model.load_document(document);
        model.fetch_hash = Some(model.compute_hash()?);
        Ok(model)
    }

    pub fn config(&self) -> &Arc<ModelConfig> {
        &self.config
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub fn primary_key(&self) -> &str {
        &self.config.primary_key
    }

    /// The primary key value, or null.
    pub fn id(&self) -> &Value {
        self.object.property(&self.config.primary_key)
    }

    /// Stored value of `name` without accessor conversions.
    pub fn property(&self, name: &str) -> &Value {
        self.object.property(name)
    }

    pub fn properties(&self, selection: Selection<'_>, ignore_nulls: bool) -> Properties {
        self.object.properties(selection, ignore_nulls)
    }

    pub fn object(&self) -> &DynamicObject {
        &self.object
    }

    /// Report of the last validation, if any ran.
    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    pub fn fetch_hash(&self) -> Option<FetchHash> {
        self.fetch_hash
    }

    pub fn is_fetched(&self) -> bool {
        self.fetch_hash.is_some()
    }

    /// The model last assigned to `field`, if still cached.
    pub fn dereferenced(&self, field: &str) -> Option<&Model> {
        self.dereferences.get(field)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check the named rule set, keeping the report for the `errors` accessor.
    pub fn validate(&mut self, rule_set: &str) -> ModelResult<bool> {
        let config = Arc::clone(&self.config);
        let rules = Self::rules(&config, rule_set)?;
        Ok(self.validate_with(rules))
    }

    /// Check an ad hoc rule set.
    pub fn validate_with(&mut self, rules: &RuleSet) -> bool {
        let report = rules.validate(self.object.raw_properties());
        let valid = report.is_valid();
        self.validation = Some(report);
        valid
    }

    fn rules<'a>(config: &'a ModelConfig, name: &str) -> ModelResult<&'a RuleSet> {
        config
            .rules
            .get(name)
            .ok_or_else(|| ModelError::MissingRuleSet(name.to_string()))
    }

    fn require_valid(&mut self, name: &str, rules: &RuleSet) -> ModelResult<()> {
        if self.validate_with(rules) {
            return Ok(());
        }
        let report = self.validation.clone().unwrap_or_default();
        debug!(collection = %self.config.collection, rule_set = name, %report, "validation failed");
        Err(ModelError::Validation {
            rule_set: name.to_string(),
            report,
        })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Look the model up by its current properties.
    ///
    /// Validates `rule_set` (default `"fetch"`) first. The filter is made of
    /// the rule set's fields or, when `strict`, of every non-null property.
    /// On a hit the document's fields are loaded and the fetch hash recorded.
    pub fn fetch(&mut self, rule_set: Option<&str>, strict: bool) -> ModelResult<bool> {
        if self.fetch_hash.is_some() {
            debug!(collection = %self.config.collection, "fetch served from cache");
            return Ok(true);
        }
        let config = Arc::clone(&self.config);
        let name = rule_set.unwrap_or(FETCH_RULES);
        let rules = Self::rules(&config, name)?;
        self.require_valid(name, rules)?;

        let filter = if strict {
            self.object.properties(Selection::All, true)
        } else {
            let fields: Vec<&str> = rules.fields().collect();
            self.object.properties(Selection::Fields(&fields), true)
        };
        match self.store.find_one(&config.collection, &filter)? {
            Some(document) => {
                self.load_document(document);
                let hash = self.compute_hash()?;
                debug!(collection = %config.collection, hash = %hash.short_hex(), "model fetched");
                self.fetch_hash = Some(hash);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forget the fetch hash so the next [`fetch`](Self::fetch) hits the store.
    pub fn invalidate(&mut self) {
        self.fetch_hash = None;
    }

    /// Add the model as a new document.
    ///
    /// The `insert` rule set is checked when configured. A null primary key
    /// is replaced by a fresh UUIDv7.
    pub fn insert(&mut self) -> ModelResult<()> {
        let config = Arc::clone(&self.config);
        if let Some(rules) = config.rules.get(INSERT_RULES) {
            self.require_valid(INSERT_RULES, rules)?;
        }
        if self.id().is_null() {
            let id = Uuid::now_v7().simple().to_string();
            self.object.store(config.primary_key.clone(), id);
        }
        self.store
            .insert(&config.collection, &config.primary_key, self.document())?;
        debug!(collection = %config.collection, id = %self.id(), "model inserted");
        Ok(())
    }

    /// Insert, or update by primary key when the key is already taken.
    pub fn save(&mut self) -> ModelResult<bool> {
        match self.insert() {
            Ok(()) => Ok(true),
            Err(ModelError::Store(StoreError::DuplicateKey { .. })) => {
                warn!(
                    collection = %self.config.collection,
                    id = %self.id(),
                    "key exists, updating instead"
                );
                self.update(&[])
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the document matching the current values of `fields`
    /// (default: the primary key). Returns `true` if one matched.
    pub fn update(&self, fields: &[&str]) -> ModelResult<bool> {
        let filter = self.filter_on(fields)?;
        self.update_matching(&filter)
    }

    /// Replace the first document matching `filter` with this model.
    pub fn update_matching(&self, filter: &Document) -> ModelResult<bool> {
        let updated = self
            .store
            .update(&self.config.collection, filter, self.document())?;
        debug!(collection = %self.config.collection, updated, "model update");
        Ok(updated)
    }

    /// Remove the document matching the current values of `fields`
    /// (default: the primary key). Returns `true` if one was removed.
    pub fn delete(&mut self, fields: &[&str]) -> ModelResult<bool> {
        let filter = self.filter_on(fields)?;
        self.delete_matching(&filter)
    }

    pub fn delete_matching(&mut self, filter: &Document) -> ModelResult<bool> {
        let removed = self.store.remove(&self.config.collection, filter)?;
        if removed {
            self.invalidate();
        }
        Ok(removed)
    }

    fn filter_on(&self, fields: &[&str]) -> ModelResult<Document> {
        let fields = if fields.is_empty() {
            vec![self.primary_key()]
        } else {
            fields.to_vec()
        };
        fields
            .into_iter()
            .map(|field| match self.object.property(field) {
                Value::Null => Err(ModelError::from(StoreError::InvalidFilter(format!(
                    "{field} is not set"
                )))),
                value => Ok((field.to_string(), value.clone())),
            })
            .collect()
    }

    /// The document written to the store: every stored property.
    pub fn document(&self) -> Document {
        self.object.raw_properties().clone()
    }

    fn load_document(&mut self, document: Document) {
        for (name, value) in document {
            self.object.store(name, value);
        }
        self.dereferences.clear();
    }

    fn compute_hash(&self) -> ModelResult<FetchHash> {
        FetchHasher::for_collection(&self.config.collection)
            .hash_json(&self.serializable_properties(&[], true))
    }

    /// Properties in their readable form: dates as ISO-8601 strings,
    /// references as stored.
    pub fn serializable_properties(&self, exclude: &[&str], ignore_nulls: bool) -> Properties {
        self.object
            .raw_properties()
            .iter()
            .filter(|(name, _)| !exclude.contains(&name.as_str()))
            .filter_map(|(name, stored)| {
                let value = if self.config.is_date(name) {
                    read_date(stored).unwrap_or_else(|_| stored.clone())
                } else {
                    stored.clone()
                };
                (!(ignore_nulls && value.is_null())).then(|| (name.clone(), value))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    /// Store a reference to `target` in `field` and cache `target`.
    ///
    /// Database references store `{"$ref", "$id"}`, manual references the
    /// bare id. Any other field stores the target's properties.
    pub fn assign(&mut self, field: &str, target: Model) -> ModelResult<()> {
        let value = match self.config.reference_kind(field) {
            Some(kind) => {
                if target.id().is_null() {
                    return Err(ModelError::InvalidReference {
                        field: field.to_string(),
                        reason: "referenced model has no id".into(),
                    });
                }
                match kind {
                    RefKind::DbRef => {
                        DocRef::new(target.collection(), target.id().clone()).to_value()
                    }
                    RefKind::Manual(_) => target.id().clone(),
                }
            }
            None => Value::Array(to_value_map(target.serializable_properties(&[], false))),
        };
        self.object.set(field, value)?;
        self.dereferences.insert(field.to_string(), target);
        Ok(())
    }

    /// Properties of the document referenced by `field`.
    ///
    /// A cached assignment is returned as is; otherwise the reference is
    /// resolved through the store. Null references yield `None`.
    pub fn reference(&self, field: &str) -> ModelResult<Option<Properties>> {
        let invalid = |reason: String| ModelError::InvalidReference {
            field: field.to_string(),
            reason,
        };
        let kind = self
            .config
            .reference_kind(field)
            .ok_or_else(|| invalid("not a reference field".into()))?;
        if let Some(model) = self.dereferences.get(field) {
            return Ok(Some(model.object.raw_properties().clone()));
        }
        let stored = self.object.property(field);
        if stored.is_null() {
            return Ok(None);
        }
        let target = match kind {
            RefKind::DbRef => DocRef::from_value(stored).ok_or_else(|| {
                invalid(format!("{} is not a database reference", stored.type_name()))
            })?,
            RefKind::Manual(collection) => DocRef::new(collection.as_str(), stored.clone()),
        };
        debug!(field, collection = %target.collection, "dereferencing");
        Ok(self.store.dereference(&target)?)
    }
}

/// Check a value assigned to a reference field.
fn reference_value(field: &str, kind: &RefKind, value: Value) -> ObjectResult<Value> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (RefKind::DbRef, value) if DocRef::is_ref(&value) => Ok(value),
        (RefKind::DbRef, value) => Err(rejected(
            field,
            format!("expected a database reference, got {}", value.describe()),
        )),
        (RefKind::Manual(_), value @ (Value::Str(_) | Value::Int(_))) => Ok(value),
        (RefKind::Manual(_), value) => Err(rejected(
            field,
            format!("expected a document id, got {}", value.describe()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Stored epoch seconds as an ISO-8601 string. Other values pass through.
fn read_date(stored: &Value) -> TypeResult<Value> {
    match stored {
        Value::Int(secs) => Ok(Value::from(Timestamp::from_epoch_seconds(*secs)?.to_atom_string())),
        other => Ok(other.clone()),
    }
}

/// Convert an assigned date to epoch seconds.
fn write_date(field: &str, value: Value) -> ObjectResult<Value> {
    match filter_input(value) {
        Value::Null => Ok(Value::Null),
        Value::Int(secs) => Ok(Value::Int(secs)),
        Value::Float(secs) => Ok(Value::Int(secs.trunc() as i64)),
        Value::Str(s) => Timestamp::parse(&s)
            .map(|ts| Value::Int(ts.epoch_seconds()))
            .map_err(|e| rejected(field, e.to_string())),
        other => Err(rejected(field, format!("expected a date, got {}", other.describe()))),
    }
}

impl PropertyAccess for Model {
    fn get(&self, field: &str) -> ObjectResult<Value> {
        if field == ERRORS_FIELD {
            return Ok(self
                .validation
                .as_ref()
                .map_or_else(|| Value::Array(ValueMap::new()), ValidationReport::to_value));
        }
        if field == ID_FIELD && self.config.primary_key != ID_FIELD {
            return self.object.get(&self.config.primary_key);
        }
        if self.config.reference_kind(field).is_some() {
            return match self.reference(field) {
                Ok(Some(properties)) => Ok(Value::Array(to_value_map(properties))),
                Ok(None) => Ok(Value::Null),
                Err(e) => Err(rejected(field, e.to_string())),
            };
        }
        if self.config.is_date(field) {
            return read_date(self.object.property(field))
                .map_err(|e| rejected(field, e.to_string()));
        }
        self.object.get(field)
    }

    fn set(&mut self, field: &str, value: Value) -> ObjectResult<()> {
        if field == ERRORS_FIELD {
            return Err(rejected(field, "read-only"));
        }
        if field == ID_FIELD && self.config.primary_key != ID_FIELD {
            let primary_key = self.config.primary_key.clone();
            return self.set(&primary_key, value);
        }
        if let Some(kind) = self.config.reference_kind(field) {
            let value = reference_value(field, kind, value)?;
            self.dereferences.remove(field);
            return self.object.set(field, value);
        }
        if self.config.is_date(field) {
            let value = write_date(field, value)?;
            return self.object.set(field, value);
        }
        self.object.set(field, value)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("collection", &self.config.collection)
            .field("properties", self.object.raw_properties())
            .field("fetch_hash", &self.fetch_hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryDocumentStore, SortOrder};
    use crate::validation::Rule;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    fn users() -> Arc<ModelConfig> {
        let email = RuleSet::new().rule("email", Rule::NotEmpty);
        Arc::new(
            ModelConfig::new("users")
                .field("email")
                .field("name")
                .date_field("created")
                .reference("owner", RefKind::DbRef)
                .reference("group", RefKind::Manual("groups".into()))
                .rule_set(FETCH_RULES, email.clone())
                .rule_set(INSERT_RULES, email),
        )
    }

    fn user(store: &Arc<dyn DocumentStore>, email: &str, name: &str) -> Model {
        Model::with_properties(users(), Arc::clone(store), [("email", email), ("name", name)])
            .unwrap()
    }

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[test]
    fn id_aliases_primary_key() {
        let mut model = Model::new(users(), store());
        model.set("id", Value::from("abc")).unwrap();
        assert_eq!(model.property("_id"), &Value::from("abc"));
        assert_eq!(model.get("id").unwrap(), Value::from("abc"));
    }

    #[test]
    fn errors_accessor_is_read_only() {
        let mut model = Model::new(users(), store());
        assert_eq!(model.get("errors").unwrap(), Value::Array(ValueMap::new()));
        assert!(matches!(model.set("errors", Value::Null), Err(ObjectError::Rejected { .. })));
        assert!(!model.validate(FETCH_RULES).unwrap());
        let errors = model.get("errors").unwrap();
        assert_eq!(errors.to_json().unwrap(), r#"{"email":"email must not be empty"}"#);
    }

    #[test]
    fn internal_and_undeclared_names() {
        let mut model = Model::new(users(), store());
        assert!(matches!(model.get("_fetch_hash"), Err(ObjectError::Inaccessible { .. })));
        assert!(matches!(model.set("age", Value::Int(3)), Err(ObjectError::Undefined { .. })));
        assert!(matches!(model.validate("nope"), Err(ModelError::MissingRuleSet(_))));
    }

    #[test]
    fn date_fields_store_epoch_seconds() {
        let mut model = Model::new(users(), store());
        model.set("created", Value::from("2005-08-15T15:52:01+00:00")).unwrap();
        assert_eq!(model.property("created"), &Value::Int(1_124_121_121));
        assert_eq!(model.get("created").unwrap(), Value::from("2005-08-15T15:52:01+00:00"));
        model.set("created", Value::Float(1_124_121_121.9)).unwrap();
        assert_eq!(model.property("created"), &Value::Int(1_124_121_121));
        assert!(matches!(
            model.set("created", Value::from("not a date")),
            Err(ObjectError::Rejected { .. })
        ));
        let serialized = model.serializable_properties(&[], true);
        assert_eq!(serialized["created"], Value::from("2005-08-15T15:52:01+00:00"));
    }

    #[test]
    fn serializable_properties_exclude_and_nulls() {
        let store = store();
        let model = user(&store, "a@b.c", "ada");
        let all = model.serializable_properties(&[], false);
        assert_eq!(all.len(), 6);
        let some = model.serializable_properties(&["email"], true);
        let names: Vec<_> = some.keys().cloned().collect();
        assert_eq!(names, vec!["name"]);
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    #[test]
    fn insert_generates_an_id() {
        let store = store();
        let mut model = user(&store, "a@b.c", "ada");
        model.insert().unwrap();
        let id = model.id().as_str().unwrap().to_string();
        assert_eq!(id.len(), 32);
        let loaded = Model::load(users(), Arc::clone(&store), id.as_str()).unwrap();
        assert_eq!(loaded.get("name").unwrap(), Value::from("ada"));
        assert!(loaded.is_fetched());
    }

    #[test]
    fn insert_checks_insert_rules() {
        let store = store();
        let mut model = user(&store, "  ", "ada");
        let err = model.insert().unwrap_err();
        assert!(matches!(err, ModelError::Validation { ref rule_set, .. } if rule_set == "insert"));
        assert!(err.to_string().contains("email must not be empty"));
        assert_eq!(Model::count(&users(), store.as_ref(), &Document::new()).unwrap(), 0);
    }

    #[test]
    fn save_falls_back_to_update() {
        let store = store();
        let mut model = user(&store, "a@b.c", "ada");
        assert!(model.save().unwrap());
        model.set("name", Value::from("ada l.")).unwrap();
        assert!(model.save().unwrap());
        assert_eq!(Model::count(&users(), store.as_ref(), &Document::new()).unwrap(), 1);
        let loaded = Model::load(users(), Arc::clone(&store), model.id().clone()).unwrap();
        assert_eq!(loaded.property("name"), &Value::from("ada l."));
    }

    #[test]
    fn update_requires_key_value() {
        let store = store();
        let model = user(&store, "a@b.c", "ada");
        let err = model.update(&[]).unwrap_err();
        assert!(matches!(err, ModelError::Store(StoreError::InvalidFilter(_))));
        assert!(!model.update(&["email"]).unwrap());
    }

    #[test]
    fn delete_removes_and_invalidates() {
        let store = store();
        let mut model = user(&store, "a@b.c", "ada");
        model.insert().unwrap();
        assert!(model.fetch(None, false).unwrap());
        assert!(model.delete(&["email"]).unwrap());
        assert!(!model.is_fetched());
        assert!(!model.delete(&[]).unwrap());
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    #[test]
    fn fetch_loads_matching_document() {
        let store = store();
        user(&store, "a@b.c", "ada").insert().unwrap();

        let mut lookup =
            Model::with_properties(users(), Arc::clone(&store), [("email", "a@b.c")]).unwrap();
        assert!(lookup.fetch(None, false).unwrap());
        assert_eq!(lookup.property("name"), &Value::from("ada"));
        assert!(!lookup.id().is_null());
        assert!(lookup.fetch_hash().is_some());
    }

    #[test]
    fn fetch_is_lazy_until_invalidated() {
        let store = store();
        user(&store, "a@b.c", "ada").insert().unwrap();
        let mut lookup =
            Model::with_properties(users(), Arc::clone(&store), [("email", "a@b.c")]).unwrap();
        assert!(lookup.fetch(None, false).unwrap());
        let hash = lookup.fetch_hash();

        store.remove("users", &doc(&[("email", Value::from("a@b.c"))])).unwrap();
        assert!(lookup.fetch(None, false).unwrap());
        assert_eq!(lookup.fetch_hash(), hash);

        lookup.invalidate();
        assert!(!lookup.fetch(None, false).unwrap());
    }

    #[test]
    fn strict_fetch_filters_on_all_properties() {
        let store = store();
        user(&store, "a@b.c", "ada").insert().unwrap();
        let mut lookup = user(&store, "a@b.c", "bob");
        assert!(!lookup.fetch(None, true).unwrap());
        assert!(lookup.fetch(None, false).unwrap());
        assert_eq!(lookup.property("name"), &Value::from("ada"));
    }

    #[test]
    fn fetch_validates_first() {
        let mut lookup = Model::new(users(), store());
        assert!(matches!(lookup.fetch(None, false), Err(ModelError::Validation { .. })));
        assert!(matches!(lookup.fetch(Some("lookup"), false), Err(ModelError::MissingRuleSet(_))));
    }

    #[test]
    fn fetch_list_sorts_and_limits() {
        let store = store();
        for (email, name) in [("c@x", "cy"), ("a@x", "ada"), ("b@x", "bob")] {
            user(&store, email, name).insert().unwrap();
        }
        let query = Query::new().sort_by("name", SortOrder::Asc).limit(2);
        let models = Model::fetch_list(&users(), &store, &query).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.property("name").clone()).collect();
        assert_eq!(names, vec![Value::from("ada"), Value::from("bob")]);
        assert!(models.iter().all(Model::is_fetched));
        let filter = doc(&[("name", Value::from("cy"))]);
        assert_eq!(Model::count(&users(), store.as_ref(), &filter).unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn assigning_a_model_stores_a_dbref_and_caches_it() {
        let store = store();
        let mut owner = user(&store, "o@x", "owner");
        owner.insert().unwrap();
        let owner_id = owner.id().clone();

        let mut model = user(&store, "a@b.c", "ada");
        model.assign("owner", owner).unwrap();
        assert_eq!(
            DocRef::from_value(model.property("owner")),
            Some(DocRef::new("users", owner_id.clone()))
        );
        assert!(model.dereferenced("owner").is_some());
        let read = model.get("owner").unwrap();
        assert_eq!(read.as_array().unwrap().get(&Key::from("name")), Some(&Value::from("owner")));

        model.insert().unwrap();
        let loaded = Model::load(users(), Arc::clone(&store), model.id().clone()).unwrap();
        assert!(loaded.dereferenced("owner").is_none());
        let resolved = loaded.reference("owner").unwrap().unwrap();
        assert_eq!(resolved["_id"], owner_id);
    }

    #[test]
    fn manual_references_store_bare_ids() {
        let store = store();
        store
            .insert(
                "groups",
                "_id",
                doc(&[("_id", Value::from("g1")), ("title", Value::from("admins"))]),
            )
            .unwrap();
        let mut model = user(&store, "a@b.c", "ada");
        model.set("group", Value::from("g1")).unwrap();
        assert_eq!(model.property("group"), &Value::from("g1"));
        let group = model.get("group").unwrap();
        assert_eq!(
            group.as_array().unwrap().get(&Key::from("title")),
            Some(&Value::from("admins"))
        );
        model.set("group", Value::Null).unwrap();
        assert_eq!(model.get("group").unwrap(), Value::Null);
    }

    #[test]
    fn bad_references_are_rejected() {
        let store = store();
        let mut model = user(&store, "a@b.c", "ada");
        assert!(matches!(model.set("owner", Value::from("x")), Err(ObjectError::Rejected { .. })));
        assert!(matches!(model.set("group", Value::Bool(true)), Err(ObjectError::Rejected { .. })));
        assert!(matches!(
            model.reference("email"),
            Err(ModelError::InvalidReference { .. })
        ));
        let unsaved = user(&store, "o@x", "owner");
        assert!(matches!(
            model.assign("owner", unsaved),
            Err(ModelError::InvalidReference { .. })
        ));
    }

    #[test]
    fn plain_reassignment_drops_cached_dereference() {
        let store = store();
        let mut owner = user(&store, "o@x", "owner");
        owner.insert().unwrap();
        let mut model = user(&store, "a@b.c", "ada");
        model.assign("owner", owner.clone()).unwrap();
        model
            .set("owner", DocRef::new("users", owner.id().clone()).to_value())
            .unwrap();
        assert!(model.dereferenced("owner").is_none());
        assert_eq!(
            model.reference("owner").unwrap().unwrap()["email"],
            Value::from("o@x")
        );
    }
}
