//! The host value tree produced by processing a document.

use base64::Engine;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use iobj_parser::{DateTimeVariant, SubKind, Token, TokenValue};
use num_bigint::BigInt;
use ordered_float::OrderedFloat;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A materialized value.
///
/// Richer than JSON: big integers, fixed decimals, typed date-times and
/// byte strings survive materialization and only flatten when converted
/// with [`Value::to_json`] or serialized with serde.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    Decimal(Decimal),
    String(String),
    DateTime {
        value: DateTime<FixedOffset>,
        variant: DateTimeVariant,
    },
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// The placeholder left in a value tree where an error was recorded,
    /// so a document never leaves the caller empty-handed.
    pub fn error_placeholder(message: impl Into<String>) -> Value {
        let mut map = IndexMap::new();
        map.insert("__error".to_string(), Value::String(message.into()));
        Value::Object(map)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// What this value calls itself in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::BigInt(_) => "big integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime { variant, .. } => match variant {
                DateTimeVariant::Date => "date",
                DateTimeVariant::Time => "time",
                DateTimeVariant::DateTime => "datetime",
            },
            Value::Bytes(_) => "binary",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// The decoded value of a scalar token, ignoring variable references.
    pub fn from_token(token: &Token) -> Value {
        match token.value() {
            TokenValue::Str(s) => Value::String(s.clone()),
            TokenValue::Number(n) => Value::Number(*n),
            TokenValue::BigInt(b) => Value::BigInt(b.clone()),
            TokenValue::Decimal(d) => Value::Decimal(*d),
            TokenValue::Bool(b) => Value::Bool(*b),
            TokenValue::Null => Value::Null,
            TokenValue::DateTime(dt) => Value::DateTime {
                value: *dt,
                variant: match token.sub_kind() {
                    Some(SubKind::DateTime(variant)) => variant,
                    _ => DateTimeVariant::DateTime,
                },
            },
            TokenValue::Bytes(b) => Value::Bytes(b.clone()),
            TokenValue::Marker => Value::Null,
            TokenValue::Error(e) => Value::error_placeholder(e.message()),
        }
    }

    /// Equality as used for `choices` membership. `NaN` is never a member
    /// of any choices set, and values only compare within their own
    /// variant.
    pub(crate) fn choice_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                !a.is_nan() && !b.is_nan() && OrderedFloat(*a) == OrderedFloat(*b)
            }
            (a, b) => a == b,
        }
    }

    /// Flatten into a JSON value. Big integers keep their digits as a
    /// string when they overflow `i64`; non-finite numbers become null;
    /// date-times format per their variant; bytes become base64.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::BigInt(b) => match i64::try_from(b) {
                Ok(n) => serde_json::Value::Number(n.into()),
                Err(_) => serde_json::Value::String(b.to_string()),
            },
            Value::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::DateTime { .. } => serde_json::Value::String(self.format_date_time()),
            Value::Bytes(b) => serde_json::Value::String(
                base64::engine::general_purpose::STANDARD.encode(b),
            ),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    fn format_date_time(&self) -> String {
        match self {
            Value::DateTime { value, variant } => match variant {
                DateTimeVariant::Date => value.format("%Y-%m-%d").to_string(),
                DateTimeVariant::Time => value.format("%H:%M:%S").to_string(),
                DateTimeVariant::DateTime => value.to_rfc3339(),
            },
            _ => unreachable!("format_date_time on a non-date value"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_unit(),
            Value::BigInt(b) => match i64::try_from(b) {
                Ok(n) => serializer.serialize_i64(n),
                Err(_) => serializer.serialize_str(&b.to_string()),
            },
            Value::Decimal(d) => match d.to_f64() {
                Some(n) => serializer.serialize_f64(n),
                None => serializer.serialize_str(&d.to_string()),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime { .. } => serializer.serialize_str(&self.format_date_time()),
            Value::Bytes(b) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(b)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn choices_equality_never_matches_nan() {
        let nan = Value::Number(f64::NAN);
        assert!(!nan.choice_eq(&nan));
        assert!(Value::Number(1.0).choice_eq(&Value::Number(1.0)));
        assert!(!Value::Number(1.0).choice_eq(&Value::String("1".into())));
    }

    #[test]
    fn json_flattening() {
        let mut map = IndexMap::new();
        map.insert("big".to_string(), Value::BigInt("9".repeat(30).parse().unwrap()));
        map.insert("small".to_string(), Value::BigInt(7.into()));
        map.insert("bytes".to_string(), Value::Bytes(b"hi".to_vec()));
        map.insert("inf".to_string(), Value::Number(f64::INFINITY));
        let value = Value::Object(map);
        assert_eq!(
            value.to_json(),
            json!({
                "big": "9".repeat(30),
                "small": 7,
                "bytes": "aGk=",
                "inf": null,
            })
        );
    }

    #[test]
    fn error_placeholder_shape() {
        let placeholder = Value::error_placeholder("boom");
        assert_eq!(placeholder.to_json(), json!({"__error": "boom"}));
    }
}
