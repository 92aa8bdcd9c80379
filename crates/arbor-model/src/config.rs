use arbor_object::{Mode, Schema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::reference::RefKind;
use crate::store::DEFAULT_KEY_FIELD;
use crate::validation::RuleSet;

/// Rule set used by [`Model::fetch`](crate::Model::fetch) when none is named.
pub const FETCH_RULES: &str = "fetch";
/// Rule set checked by [`Model::insert`](crate::Model::insert) when defined.
pub const INSERT_RULES: &str = "insert";

/// Names reserved for model state. Reads and writes of them fail.
pub const INTERNAL_NAMES: &[&str] = &[
    "_collection",
    "_fetch_hash",
    "_validation",
    "_references",
    "_dereferences",
];

/// Layout and persistence settings of one model type.
///
/// ```toml
/// collection = "users"
/// fields = ["email", "name"]
/// dates = ["created"]
///
/// [references]
/// owner = "dbref"
/// group = { manual = "groups" }
///
/// [rules.fetch]
/// email = ["not_empty", { max_length = 64 }]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Store collection holding the documents.
    pub collection: String,
    /// Name of the primary key field.
    pub primary_key: String,
    /// Handling of fields that are not declared.
    pub mode: Mode,
    /// Declared plain fields.
    pub fields: Vec<String>,
    /// Fields stored as epoch seconds and read as ISO-8601 strings.
    pub dates: Vec<String>,
    /// Fields holding references to other documents.
    pub references: IndexMap<String, RefKind>,
    /// Named validation rule sets.
    pub rules: IndexMap<String, RuleSet>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            collection: String::new(),
            primary_key: DEFAULT_KEY_FIELD.to_string(),
            mode: Mode::Strict,
            fields: Vec::new(),
            dates: Vec::new(),
            references: IndexMap::new(),
            rules: IndexMap::new(),
        }
    }
}

impl ModelConfig {
    /// Documents in `collection`, keyed by `_id`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Rows of `table`, keyed by the table name in lower camel case followed
    /// by `Id` (`UserGroup` is keyed by `userGroupId`).
    pub fn relational(table: impl Into<String>) -> Self {
        let table = table.into();
        let bare: String = table.chars().filter(|c| *c != '`').collect();
        let mut chars = bare.chars();
        let primary_key = match chars.next() {
            Some(first) => format!("{}{}Id", first.to_lowercase(), chars.as_str()),
            None => "id".to_string(),
        };
        Self {
            collection: table,
            primary_key,
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> ModelResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ModelError::Config(e.to_string()))?;
        if config.collection.trim().is_empty() {
            return Err(ModelError::Config("collection name is required".into()));
        }
        Ok(config)
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn date_field(mut self, name: impl Into<String>) -> Self {
        self.dates.push(name.into());
        self
    }

    pub fn reference(mut self, name: impl Into<String>, kind: RefKind) -> Self {
        self.references.insert(name.into(), kind);
        self
    }

    pub fn rule_set(mut self, name: impl Into<String>, rules: RuleSet) -> Self {
        self.rules.insert(name.into(), rules);
        self
    }

    pub fn is_date(&self, name: &str) -> bool {
        self.dates.iter().any(|d| d == name)
    }

    pub fn reference_kind(&self, name: &str) -> Option<&RefKind> {
        self.references.get(name)
    }

    /// Property layout: the primary key, then plain, date and reference
    /// fields, all defaulting to null.
    pub fn schema(&self) -> Schema {
        let declared = std::iter::once(&self.primary_key)
            .chain(&self.fields)
            .chain(&self.dates)
            .chain(self.references.keys());
        let schema = declared.fold(Schema::new(&self.collection), |schema, name| {
            schema.field(name)
        });
        INTERNAL_NAMES
            .iter()
            .fold(schema, |schema, name| schema.internal(*name))
    }
}
