//! Converts a `Value` into the parameter type the server reported for its slot.

use crate::sql::{
    base::error::DbError,
    postgres::{
        data_type::{PgKind, classify},
        params::PgParam,
        utils::parse_array_string,
    },
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::core::value::Value;
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::types::{Json as PgJson, Type};
use uuid::Uuid;

pub fn coerce(column: &str, value: &Value, ty: &Type) -> Result<PgParam, DbError> {
    if value.is_null() {
        return Ok(PgParam::null());
    }

    let fail = |reason: &str| DbError::Coercion {
        column: column.to_string(),
        expected: ty.name().to_string(),
        found: value.kind(),
        reason: reason.to_string(),
    };

    // Non-native slots are rendered as `$n::text` and cast server-side.
    let Some(kind) = classify(ty) else {
        return text(value).map(PgParam::new).ok_or_else(|| fail("no text form"));
    };

    let param = match kind {
        PgKind::Bool => PgParam::new(value.as_bool().ok_or_else(|| fail("not a boolean"))?),
        PgKind::Int2 => {
            let v = value.as_i64().ok_or_else(|| fail("not an integer"))?;
            PgParam::new(i16::try_from(v).map_err(|_| fail("out of range for smallint"))?)
        }
        PgKind::Int4 => {
            let v = value.as_i64().ok_or_else(|| fail("not an integer"))?;
            PgParam::new(i32::try_from(v).map_err(|_| fail("out of range for integer"))?)
        }
        PgKind::Int8 => PgParam::new(value.as_i64().ok_or_else(|| fail("not an integer"))?),
        PgKind::Float4 => PgParam::new(value.as_f64().ok_or_else(|| fail("not a number"))? as f32),
        PgKind::Float8 => PgParam::new(value.as_f64().ok_or_else(|| fail("not a number"))?),
        PgKind::Numeric => PgParam::new(decimal(value).ok_or_else(|| fail("not a decimal"))?),
        PgKind::Text => PgParam::new(text(value).ok_or_else(|| fail("no text form"))?),
        PgKind::Uuid => PgParam::new(uuid(value).ok_or_else(|| fail("not a uuid"))?),
        PgKind::TimestampTz => {
            PgParam::new(timestamp_tz(value).ok_or_else(|| fail("not a timestamp"))?)
        }
        PgKind::Timestamp => {
            PgParam::new(timestamp(value).ok_or_else(|| fail("not a timestamp"))?)
        }
        PgKind::Date => PgParam::new(date(value).ok_or_else(|| fail("not a date"))?),
        PgKind::Json => PgParam::new(PgJson(json(value).map_err(|e| fail(&e))?)),
        PgKind::TextArray => PgParam::new(text_array(value).ok_or_else(|| fail("not an array"))?),
        PgKind::Bytea => PgParam::new(bytes(value).ok_or_else(|| fail("not binary"))?),
    };

    Ok(param)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        // Postgres array literal, so `text[]`-shaped values cast cleanly.
        Value::StringArray(items) => Some(format!(
            "{{{}}}",
            items
                .iter()
                .map(|s| format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")))
                .collect::<Vec<_>>()
                .join(",")
        )),
        other => other.to_text(),
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Decimal(d) => Some(*d),
        Value::SmallInt(v) => Some(Decimal::from(*v)),
        Value::Int32(v) => Some(Decimal::from(*v)),
        Value::Int(v) => Some(Decimal::from(*v)),
        Value::Float(v) => Decimal::try_from(*v).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Json(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn uuid(value: &Value) -> Option<Uuid> {
    match value {
        Value::Uuid(u) => Some(*u),
        Value::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

fn timestamp_tz(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::TimestampNaive(ts) => Some(ts.and_utc()),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(|ts| ts.and_utc()),
        Value::String(s) => parse_datetime(s),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::TimestampNaive(ts) => Some(*ts),
        Value::Timestamp(ts) => Some(ts.naive_utc()),
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        Value::String(s) => parse_naive_datetime(s),
        _ => None,
    }
}

fn date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Timestamp(ts) => Some(ts.date_naive()),
        Value::TimestampNaive(ts) => Some(ts.date()),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_naive_datetime(s).map(|ts| ts.date())),
        _ => None,
    }
}

fn json(value: &Value) -> Result<serde_json::Value, String> {
    match value {
        Value::Json(v) => Ok(v.clone()),
        Value::String(s) => serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}")),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::SmallInt(v) => Ok((*v).into()),
        Value::Int32(v) => Ok((*v).into()),
        Value::Int(v) => Ok((*v).into()),
        Value::Float(v) => Ok((*v).into()),
        Value::StringArray(items) => Ok(items.clone().into()),
        other => Err(format!("{} has no JSON form", other.kind())),
    }
}

fn text_array(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::StringArray(items) => Some(items.clone()),
        Value::String(s) => Some(parse_array_string(s)),
        Value::Json(serde_json::Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| item.to_string())
                })
                .collect(),
        ),
        _ => None,
    }
}

fn bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Bytes(b) => Some(b.clone()),
        Value::String(s) => Some(s.clone().into_bytes()),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Postgres text output: `2024-03-01 12:30:00.123+00`
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    parse_naive_datetime(raw).map(|naive| naive.and_utc())
}

fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn null_binds_for_any_type() {
        assert!(coerce("x", &Value::Null, &Type::UUID).is_ok());
        assert!(coerce("x", &Value::Null, &Type::INET).is_ok());
    }

    #[test]
    fn integers_are_range_checked() {
        let err = coerce("age", &Value::Int(70_000), &Type::INT2).unwrap_err();
        assert!(err.to_string().contains("out of range for smallint"));
        assert!(coerce("age", &Value::Int(42), &Type::INT2).is_ok());
    }

    #[test]
    fn json_text_is_parsed_and_garbage_rejected() {
        assert!(coerce("seo_data", &Value::from(r#"{"a":1}"#), &Type::JSONB).is_ok());
        let err = coerce("seo_data", &Value::from("{oops"), &Type::JSONB).unwrap_err();
        match err {
            DbError::Coercion { column, found, .. } => {
                assert_eq!(column, "seo_data");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn string_forms_convert_to_typed_values() {
        assert_eq!(
            uuid(&Value::from("00000000-0000-0000-0000-000000000000")),
            Some(Uuid::nil())
        );
        assert_eq!(
            parse_datetime("2024-03-01 12:30:00.5+00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap() + chrono::Duration::milliseconds(500))
        );
        assert_eq!(
            decimal(&Value::from("19.90")),
            Some(Decimal::from_str("19.90").unwrap())
        );
        assert_eq!(
            date(&Value::from("2024-02-29")),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn string_arrays_render_as_postgres_literals_for_casts() {
        let value = Value::StringArray(vec!["a".into(), "say \"hi\"".into()]);
        assert_eq!(text(&value).unwrap(), r#"{"a","say \"hi\""}"#);
    }

    #[test]
    fn json_arrays_bind_to_text_arrays() {
        let value = Value::Json(serde_json::json!(["wool", 3]));
        assert_eq!(text_array(&value), Some(vec!["wool".to_string(), "3".to_string()]));
    }
}
