use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::value::Value;

/// Descriptor of the values an element constraint accepts.
///
/// Primitive kinds are matched by variant. [`TypeTag::Instance`] accepts
/// records of the named class or of any class whose lineage includes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    Null,
    /// Ints, floats and numeric strings.
    Numeric,
    /// Bools, ints, floats and strings.
    Scalar,
    Instance(String),
}

impl TypeTag {
    /// The tag describing `value`. Records yield their class.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(record) => TypeTag::Instance(record.class().to_string()),
        }
    }

    /// Returns `true` if `value` satisfies this descriptor.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeTag::Bool, Value::Bool(_))
            | (TypeTag::Int, Value::Int(_))
            | (TypeTag::Float, Value::Float(_))
            | (TypeTag::String, Value::Str(_))
            | (TypeTag::Array, Value::Array(_))
            | (TypeTag::Object, Value::Object(_))
            | (TypeTag::Null, Value::Null) => true,
            (TypeTag::Numeric, v) => v.is_numeric(),
            (TypeTag::Scalar, v) => v.is_scalar(),
            (TypeTag::Instance(class), Value::Object(record)) => record.is_instance_of(class),
            _ => false,
        }
    }

    /// Canonical name of the descriptor.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Bool => "boolean",
            TypeTag::Int => "integer",
            TypeTag::Float => "double",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Null => "null",
            TypeTag::Numeric => "numeric",
            TypeTag::Scalar => "scalar",
            TypeTag::Instance(class) => class,
        }
    }
}

impl FromStr for TypeTag {
    type Err = TypeError;

    /// Parse a type name. Primitive aliases are case-insensitive; any other
    /// identifier (`A-Z a-z 0-9 _ \`, not starting with a digit) names a class.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => TypeTag::Bool,
            "int" | "integer" | "long" => TypeTag::Int,
            "float" | "double" | "real" => TypeTag::Float,
            "string" => TypeTag::String,
            "array" => TypeTag::Array,
            "object" => TypeTag::Object,
            "null" => TypeTag::Null,
            "numeric" => TypeTag::Numeric,
            "scalar" => TypeTag::Scalar,
            _ if is_class_name(s) => TypeTag::Instance(s.trim_start_matches('\\').to_string()),
            _ => return Err(TypeError::InvalidTypeName(s.to_string())),
        };
        Ok(tag)
    }
}

fn is_class_name(s: &str) -> bool {
    let name = s.trim_start_matches('\\');
    let Some(first) = name.chars().next() else {
        return false;
    };
    !first.is_ascii_digit()
        && !name.ends_with('\\')
        && !name.contains("\\\\")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\\')
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, ValueMap};

    #[test]
    fn parses_primitive_aliases() {
        assert_eq!("integer".parse::<TypeTag>().unwrap(), TypeTag::Int);
        assert_eq!("INT".parse::<TypeTag>().unwrap(), TypeTag::Int);
        assert_eq!("double".parse::<TypeTag>().unwrap(), TypeTag::Float);
        assert_eq!("boolean".parse::<TypeTag>().unwrap(), TypeTag::Bool);
        assert_eq!("numeric".parse::<TypeTag>().unwrap(), TypeTag::Numeric);
    }

    #[test]
    fn parses_class_names() {
        assert_eq!(
            "App\\Models\\User".parse::<TypeTag>().unwrap(),
            TypeTag::Instance("App\\Models\\User".into())
        );
        assert_eq!(
            "\\Post".parse::<TypeTag>().unwrap(),
            TypeTag::Instance("Post".into())
        );
    }

    #[test]
    fn rejects_invalid_names() {
        for s in ["", "9lives", "a b", "x-y", "Trailing\\", "\\"] {
            assert!(
                matches!(s.parse::<TypeTag>(), Err(TypeError::InvalidTypeName(_))),
                "{s:?}"
            );
        }
    }

    #[test]
    fn primitive_matching_is_strict() {
        assert!(TypeTag::Int.matches(&Value::Int(123)));
        assert!(!TypeTag::Int.matches(&Value::Float(123.456)));
        assert!(!TypeTag::Int.matches(&Value::from("456")));
        assert!(!TypeTag::Int.matches(&Value::Bool(true)));
        assert!(TypeTag::Array.matches(&Value::Array(ValueMap::new())));
    }

    #[test]
    fn numeric_and_scalar() {
        assert!(TypeTag::Numeric.matches(&Value::from("456")));
        assert!(!TypeTag::Numeric.matches(&Value::from("string")));
        assert!(TypeTag::Scalar.matches(&Value::Bool(false)));
        assert!(!TypeTag::Scalar.matches(&Value::Null));
    }

    #[test]
    fn instance_matching_follows_lineage() {
        let admin = Value::from(Record::new("Admin").with_lineage(["User"]));
        assert!(TypeTag::Instance("User".into()).matches(&admin));
        assert!(TypeTag::Object.matches(&admin));
        assert!(!TypeTag::Instance("Post".into()).matches(&admin));
        assert!(!TypeTag::Instance("User".into()).matches(&Value::from("User")));
    }

    #[test]
    fn tag_of_value() {
        assert_eq!(TypeTag::of(&Value::Float(1.0)), TypeTag::Float);
        assert_eq!(
            TypeTag::of(&Value::from(Record::new("Post"))),
            TypeTag::Instance("Post".into())
        );
    }

    #[test]
    fn serde_uses_names() {
        let tag: TypeTag = serde_json::from_str("\"string\"").unwrap();
        assert_eq!(tag, TypeTag::String);
        assert_eq!(serde_json::to_string(&TypeTag::Int).unwrap(), "\"integer\"");
        assert!(serde_json::from_str::<TypeTag>("\"no good\"").is_err());
    }
}
