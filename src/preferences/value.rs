//! Untyped stored values and the conversions typed handles build on

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A value as the backend stores it, before any typed interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Boolean(bool),
    StringSet(BTreeSet<String>),
}

/// Kind tag of a [`RawValue`], persisted next to the encoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Int,
    Long,
    Float,
    Boolean,
    StringSet,
}

impl ValueKind {
    pub const ALL: [ValueKind; 6] = [
        ValueKind::String,
        ValueKind::Int,
        ValueKind::Long,
        ValueKind::Float,
        ValueKind::Boolean,
        ValueKind::StringSet,
    ];

    /// Tag used in the database and in exports
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::StringSet => "string_set",
        }
    }

    pub fn parse(tag: &str) -> Result<Self> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| anyhow::anyhow!("Unknown value kind '{}'", tag))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RawValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            RawValue::String(_) => ValueKind::String,
            RawValue::Int(_) => ValueKind::Int,
            RawValue::Long(_) => ValueKind::Long,
            RawValue::Float(_) => ValueKind::Float,
            RawValue::Boolean(_) => ValueKind::Boolean,
            RawValue::StringSet(_) => ValueKind::StringSet,
        }
    }

    /// Encode the payload as text for a `value` column
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            RawValue::String(v) => v.clone(),
            RawValue::Int(v) => v.to_string(),
            RawValue::Long(v) => v.to_string(),
            RawValue::Float(v) => v.to_string(),
            RawValue::Boolean(v) => v.to_string(),
            RawValue::StringSet(v) => {
                serde_json::to_string(v).context("Failed to encode string set")?
            }
        })
    }

    /// Decode text produced by [`RawValue::encode`] for the given kind
    pub fn decode(kind: ValueKind, text: &str) -> Result<Self> {
        let value = match kind {
            ValueKind::String => RawValue::String(text.to_string()),
            ValueKind::Int => RawValue::Int(text.parse().context("Failed to parse as int")?),
            ValueKind::Long => RawValue::Long(text.parse().context("Failed to parse as long")?),
            ValueKind::Float => {
                RawValue::Float(text.parse().context("Failed to parse as float")?)
            }
            ValueKind::Boolean => {
                RawValue::Boolean(text.parse().context("Failed to parse as boolean")?)
            }
            ValueKind::StringSet => RawValue::StringSet(
                serde_json::from_str(text).context("Failed to parse as string set")?,
            ),
        };
        Ok(value)
    }

    /// Parse user input (e.g. from the command line) as a value of `kind`
    ///
    /// String sets are given as comma separated items.
    pub fn parse_input(kind: ValueKind, input: &str) -> Result<Self> {
        match kind {
            ValueKind::StringSet => Ok(RawValue::StringSet(
                input
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            _ => Self::decode(kind, input)
                .with_context(|| format!("Invalid {} value: '{}'", kind, input)),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::String(v) => write!(f, "{}", v),
            RawValue::Int(v) => write!(f, "{}", v),
            RawValue::Long(v) => write!(f, "{}", v),
            RawValue::Float(v) => write!(f, "{}", v),
            RawValue::Boolean(v) => write!(f, "{}", v),
            RawValue::StringSet(v) => {
                let items: Vec<&str> = v.iter().map(String::as_str).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Rust types that map onto exactly one [`RawValue`] variant
pub trait PrimitiveValue: Clone + Send + Sync + 'static {
    const KIND: ValueKind;

    /// Returns `None` when `raw` is of a different kind
    fn from_raw(raw: RawValue) -> Option<Self>;

    fn into_raw(self) -> RawValue;
}

macro_rules! primitive_value {
    ($ty:ty, $variant:ident) => {
        impl PrimitiveValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_raw(raw: RawValue) -> Option<Self> {
                match raw {
                    RawValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_raw(self) -> RawValue {
                RawValue::$variant(self)
            }
        }
    };
}

primitive_value!(String, String);
primitive_value!(i32, Int);
primitive_value!(i64, Long);
primitive_value!(f32, Float);
primitive_value!(bool, Boolean);
primitive_value!(BTreeSet<String>, StringSet);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_parse_back() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(ValueKind::parse("double").is_err());
    }

    #[test]
    fn test_string_set_encoding() {
        let set: BTreeSet<String> = ["b".to_string(), "a".to_string()].into();
        let raw = RawValue::StringSet(set.clone());

        let text = raw.encode().unwrap();
        assert_eq!(text, r#"["a","b"]"#);
        assert_eq!(RawValue::decode(ValueKind::StringSet, &text).unwrap(), raw);
    }

    #[test]
    fn test_decode_rejects_bad_payload() {
        assert!(RawValue::decode(ValueKind::Int, "eighty").is_err());
        assert!(RawValue::decode(ValueKind::Int, "3000000000").is_err());
        assert!(RawValue::decode(ValueKind::Boolean, "yes").is_err());
        assert!(RawValue::decode(ValueKind::StringSet, "a,b").is_err());
    }

    #[test]
    fn test_parse_input_string_set() {
        let raw = RawValue::parse_input(ValueKind::StringSet, "toyota, mazda,,honda").unwrap();
        let expected: BTreeSet<String> =
            ["honda", "mazda", "toyota"].iter().map(|s| s.to_string()).collect();
        assert_eq!(raw, RawValue::StringSet(expected));
    }

    #[test]
    fn test_primitive_kind_mismatch() {
        assert_eq!(i32::from_raw(RawValue::Int(5)), Some(5));
        assert_eq!(i32::from_raw(RawValue::Long(5)), None);
        assert_eq!(bool::from_raw(RawValue::String("true".into())), None);
        assert_eq!(42i64.into_raw(), RawValue::Long(42));
    }
}
