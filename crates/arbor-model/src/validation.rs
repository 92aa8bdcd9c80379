//! Field validation rules.
//!
//! A [`RuleSet`] maps field names to an ordered list of [`Rule`]s. Checking a
//! set of properties stops at the first failing rule of each field and
//! records one message per failed field in a [`ValidationReport`]. Rules
//! other than `required` and `not_empty` pass on empty values, so optional
//! fields are only checked when present.

use std::fmt;

use arbor_object::Properties;
use arbor_types::{Key, Value, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One validation rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// The value is not null.
    Required,
    /// The value is not null, `false`, an empty string or an empty array.
    NotEmpty,
    /// The string form has exactly this many characters.
    ExactLength(usize),
    /// The string form has at most this many characters.
    MaxLength(usize),
    /// An integer, float or numeric string.
    Numeric,
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Str(s) => s.is_empty(),
        Value::Array(map) => map.is_empty(),
        _ => false,
    }
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::NotEmpty => "not_empty",
            Rule::ExactLength(_) => "exact_length",
            Rule::MaxLength(_) => "max_length",
            Rule::Numeric => "numeric",
        }
    }

    /// Check `value`, returning the failure message for `field`.
    pub fn check(&self, field: &str, value: &Value) -> Option<String> {
        match self {
            Rule::Required if value.is_null() => Some(format!("{field} is required")),
            Rule::NotEmpty if is_empty(value) => Some(format!("{field} must not be empty")),
            Rule::Required | Rule::NotEmpty => None,
            _ if is_empty(value) => None,
            Rule::ExactLength(n) if value.to_string().chars().count() != *n => {
                Some(format!("{field} must be exactly {n} characters long"))
            }
            Rule::MaxLength(n) if value.to_string().chars().count() > *n => {
                Some(format!("{field} must not exceed {n} characters long"))
            }
            Rule::Numeric if !value.is_numeric() => Some(format!("{field} must be numeric")),
            _ => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::ExactLength(n) | Rule::MaxLength(n) => write!(f, "{}({n})", self.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// Rules per field, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(IndexMap<String, Vec<Rule>>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rule` to the rules of `field`.
    pub fn rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.0.entry(field.into()).or_default().push(rule);
        self
    }

    /// Fields the set constrains.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn rules_for(&self, field: &str) -> &[Rule] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check `properties`. Missing fields are checked as null.
    pub fn validate(&self, properties: &Properties) -> ValidationReport {
        let errors = self
            .0
            .iter()
            .filter_map(|(field, rules)| {
                let value = properties.get(field).unwrap_or(&Value::Null);
                rules
                    .iter()
                    .find_map(|rule| rule.check(field, value))
                    .map(|message| (field.clone(), message))
            })
            .collect();
        ValidationReport { errors }
    }
}

/// Outcome of checking a [`RuleSet`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: IndexMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failure messages keyed by field.
    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// The messages as a keyed array value.
    pub fn to_value(&self) -> Value {
        let map: ValueMap = self
            .errors
            .iter()
            .map(|(field, message)| (Key::from(field.as_str()), Value::from(message.as_str())))
            .collect();
        Value::Array(map)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.errors).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, Value)]) -> Properties {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn presence_rules() {
        assert!(Rule::Required.check("a", &Value::Null).is_some());
        assert!(Rule::Required.check("a", &Value::from("")).is_none());
        assert!(Rule::NotEmpty.check("a", &Value::from("")).is_some());
        assert!(Rule::NotEmpty.check("a", &Value::Bool(false)).is_some());
        assert!(Rule::NotEmpty.check("a", &Value::Int(0)).is_none());
    }

    #[test]
    fn format_rules_skip_empty_values() {
        assert!(Rule::ExactLength(24).check("id", &Value::Null).is_none());
        assert!(Rule::Numeric.check("n", &Value::from("")).is_none());
        assert!(Rule::Numeric.check("n", &Value::from("12.5")).is_none());
        assert!(Rule::Numeric.check("n", &Value::from("twelve")).is_some());
    }

    #[test]
    fn length_rules_count_characters() {
        assert!(Rule::ExactLength(3).check("c", &Value::from("été")).is_none());
        assert!(Rule::MaxLength(2).check("c", &Value::from("abc")).is_some());
        assert!(Rule::MaxLength(3).check("c", &Value::Int(123)).is_none());
    }

    #[test]
    fn first_failure_per_field_is_reported() {
        let rules = RuleSet::new()
            .rule("email", Rule::NotEmpty)
            .rule("email", Rule::MaxLength(5))
            .rule("age", Rule::Numeric)
            .rule("name", Rule::MaxLength(10));
        let report =
            rules.validate(&props(&[("age", Value::from("x")), ("name", Value::from("ada"))]));
        assert!(!report.is_valid());
        assert_eq!(report.errors().len(), 2);
        assert_eq!(report.error("email"), Some("email must not be empty"));
        assert_eq!(report.error("age"), Some("age must be numeric"));
        assert_eq!(
            report.to_string(),
            r#"{"email":"email must not be empty","age":"age must be numeric"}"#
        );
        let fields: Vec<_> = rules.fields().collect();
        assert_eq!(fields, vec!["email", "age", "name"]);
        assert_eq!(rules.rules_for("email").len(), 2);
    }

    #[test]
    fn valid_report_is_empty_array() {
        let report = RuleSet::new()
            .rule("a", Rule::Required)
            .validate(&props(&[("a", Value::Int(1))]));
        assert!(report.is_valid());
        assert_eq!(report.to_value(), Value::Array(ValueMap::new()));
    }

    #[test]
    fn rule_set_from_toml() {
        let rules: RuleSet = toml::from_str(
            r#"
            _id = [{ exact_length = 24 }]
            email = ["not_empty", { max_length = 64 }]
            "#,
        )
        .unwrap();
        assert_eq!(rules.rules_for("_id"), &[Rule::ExactLength(24)]);
        assert_eq!(rules.rules_for("email")[1].to_string(), "max_length(64)");
    }
}
