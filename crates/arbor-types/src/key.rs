use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::is_numeric_str;

/// A key into a [`ValueMap`](crate::ValueMap).
///
/// Keys are either integers or strings. A string that is the canonical decimal
/// form of an `i64` (`"0"`, `"42"`, `"-7"`, but not `"007"`, `"-0"` or `"1.0"`)
/// is always normalized to [`Key::Int`], so `"5"` and `5` address the same
/// entry.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Build a key from a string, normalizing canonical integers.
    pub fn parse(s: &str) -> Self {
        match canonical_int(s) {
            Some(n) => Key::Int(n),
            None => Key::Str(s.to_string()),
        }
    }

    /// Returns `true` for integer keys.
    pub fn is_int(&self) -> bool {
        matches!(self, Key::Int(_))
    }

    /// The integer value, if this is an integer key.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Str(_) => None,
        }
    }

    /// The numeric value of an integer key or of a numeric string key such as
    /// `"1.5"` or `" 2"`.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Key::Int(n) => Some(*n as f64),
            Key::Str(s) if is_numeric_str(s) => s.trim().parse().ok(),
            Key::Str(_) => None,
        }
    }

    /// The string value, if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Int(_) => None,
            Key::Str(s) => Some(s),
        }
    }
}

fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(i64::from(n))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::parse(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        match canonical_int(&s) {
            Some(n) => Key::Int(n),
            None => Key::Str(s),
        }
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Int(n) => serializer.serialize_i64(*n),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or string key")
            }

            fn visit_i64<E: de::Error>(self, n: i64) -> Result<Key, E> {
                Ok(Key::Int(n))
            }

            fn visit_u64<E: de::Error>(self, n: u64) -> Result<Key, E> {
                i64::try_from(n)
                    .map(Key::Int)
                    .map_err(|_| E::custom(format!("key {n} out of range")))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Key, E> {
                Ok(Key::parse(s))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}
