use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, hash::Hash};
use uuid::Uuid;

/// A single column value as read from the source or bound to the destination.
///
/// Variants mirror the Postgres types the engine decodes natively. Anything
/// else travels as `String` and is cast server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    SmallInt(i16),
    Int32(i32),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    TimestampNaive(NaiveDateTime),
    StringArray(Vec<String>),
    Null,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            SmallInt(v) => v.hash(state),
            Int32(v) => v.hash(state),
            Int(v) => v.hash(state),
            Float(v) => {
                // Hash the bits of the float to handle NaN and -0.0 correctly
                let bits = v.to_bits();
                bits.hash(state);
            }
            Decimal(v) => v.hash(state),
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Json(v) => {
                let json_str = serde_json::to_string(v).unwrap_or_default();
                json_str.hash(state);
            }
            Uuid(v) => v.hash(state),
            Bytes(v) => v.hash(state),
            Date(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            TimestampNaive(v) => v.hash(state),
            StringArray(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int(v) => Some(*v),
            Value::String(v) => v.trim().parse::<i64>().ok(),
            Value::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::SmallInt(v) => Some(*v as f64),
            Value::Int32(v) => Some(*v as f64),
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(v) => v.to_string().parse::<f64>().ok(),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::SmallInt(v) => Some(*v != 0),
            Value::Int32(v) => Some(*v != 0),
            Value::Int(v) => Some(*v != 0),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" | "t" | "1" => Some(true),
                "false" | "f" | "0" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            Value::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Text form used when a value is bound to a text parameter.
    /// Returns `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::SmallInt(v) => Some(v.to_string()),
            Value::Int32(v) => Some(v.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Decimal(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => Some(v.to_string()),
            Value::Uuid(v) => Some(v.to_string()),
            Value::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::TimestampNaive(v) => Some(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::StringArray(v) => Some(serde_json::Value::from(v.clone()).to_string()),
            Value::Null => None,
        }
    }

    /// Short type name, used in coercion error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::SmallInt(_) => "smallint",
            Value::Int32(_) => "integer",
            Value::Int(_) => "bigint",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamptz",
            Value::TimestampNaive(_) => "timestamp",
            Value::StringArray(_) => "text[]",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
