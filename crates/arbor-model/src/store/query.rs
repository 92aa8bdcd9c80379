use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use arbor_types::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A stored document: field names to values, in insertion order.
pub type Document = IndexMap<String, Value>;

/// Direction of one sort key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = StoreError;

    /// Accepts `asc`/`desc` in any case, or `1`/`-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(SortOrder::Asc),
            "desc" | "-1" => Ok(SortOrder::Desc),
            other => Err(StoreError::InvalidFilter(format!("unknown sort direction: {other}"))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Parameters of a multi-document lookup.
///
/// The filter is a conjunction of field equalities; a null filter value also
/// matches documents that lack the field. An empty projection returns whole
/// documents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub filter: Document,
    pub sort: Vec<(String, SortOrder)>,
    pub fields: Vec<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Add an equality condition.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    pub fn project(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Total order used for sorting documents.
///
/// Nulls sort first, then numbers (integers and floats compared by value),
/// then strings, booleans, arrays and objects. Values of the last three
/// kinds compare equal among themselves.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    fn number(v: &Value) -> Option<f64> {
        match v {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => match (number(x), number(y)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => rank(x).cmp(&rank(y)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parsing() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("-1".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!(matches!(
            "sideways".parse::<SortOrder>(),
            Err(StoreError::InvalidFilter(_))
        ));
    }

    #[test]
    fn query_builder() {
        let q = Query::new()
            .where_eq("status", "live")
            .sort_by("age", SortOrder::Desc)
            .project(&["name"])
            .limit(5);
        assert_eq!(q.filter["status"], Value::from("live"));
        assert_eq!(q.sort, vec![("age".to_string(), SortOrder::Desc)]);
        assert_eq!(q.fields, vec!["name".to_string()]);
        assert_eq!(q.limit, Some(5));
    }

    #[test]
    fn mixed_numbers_compare_by_value() {
        assert_eq!(compare_values(&Value::Int(2), &Value::Float(1.5)), Ordering::Greater);
        assert_eq!(compare_values(&Value::Null, &Value::Int(0)), Ordering::Less);
        assert_eq!(compare_values(&Value::from("a"), &Value::Int(9)), Ordering::Greater);
        assert_eq!(compare_values(&Value::from("a"), &Value::from("b")), Ordering::Less);
    }
}
