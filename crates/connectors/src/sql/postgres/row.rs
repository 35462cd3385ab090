use crate::sql::{
    base::error::DbError,
    postgres::data_type::{PgKind, classify},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use rust_decimal::Decimal;
use tokio_postgres::{
    Row as PgRow,
    types::{FromSql, Json as PgJson},
};
use uuid::Uuid;

/// Decodes every column of `row`. Columns of non-native types are expected
/// to have been selected as text.
pub fn to_row_data(row: &PgRow, entity: &str) -> Result<RowData, DbError> {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = decode(row, idx, classify(column.type_()))?;
            Ok(FieldValue::new(column.name(), value))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(RowData::new(entity, fields))
}

fn decode(row: &PgRow, idx: usize, kind: Option<PgKind>) -> Result<Value, DbError> {
    let value = match kind {
        Some(PgKind::Bool) => get::<bool>(row, idx)?.map(Value::Boolean),
        Some(PgKind::Int2) => get::<i16>(row, idx)?.map(Value::SmallInt),
        Some(PgKind::Int4) => get::<i32>(row, idx)?.map(Value::Int32),
        Some(PgKind::Int8) => get::<i64>(row, idx)?.map(Value::Int),
        Some(PgKind::Float4) => get::<f32>(row, idx)?.map(|v| Value::Float(v as f64)),
        Some(PgKind::Float8) => get::<f64>(row, idx)?.map(Value::Float),
        Some(PgKind::Numeric) => get::<Decimal>(row, idx)?.map(Value::Decimal),
        Some(PgKind::Text) | None => get::<String>(row, idx)?.map(Value::String),
        Some(PgKind::Uuid) => get::<Uuid>(row, idx)?.map(Value::Uuid),
        Some(PgKind::TimestampTz) => get::<DateTime<Utc>>(row, idx)?.map(Value::Timestamp),
        Some(PgKind::Timestamp) => get::<NaiveDateTime>(row, idx)?.map(Value::TimestampNaive),
        Some(PgKind::Date) => get::<NaiveDate>(row, idx)?.map(Value::Date),
        Some(PgKind::Json) => {
            get::<PgJson<serde_json::Value>>(row, idx)?.map(|json| Value::Json(json.0))
        }
        Some(PgKind::TextArray) => get::<Vec<Option<String>>>(row, idx)?
            .map(|items| Value::StringArray(items.into_iter().flatten().collect())),
        Some(PgKind::Bytea) => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
    };

    Ok(value.unwrap_or(Value::Null))
}

fn get<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize) -> Result<Option<T>, DbError> {
    row.try_get::<_, Option<T>>(idx).map_err(|err| {
        let column = &row.columns()[idx];
        DbError::Decode {
            column: column.name().to_string(),
            data_type: column.type_().name().to_string(),
            reason: err.to_string(),
        }
    })
}
