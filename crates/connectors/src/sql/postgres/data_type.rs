//! Which Postgres types the engine decodes and binds natively.

use tokio_postgres::types::{Kind, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Uuid,
    TimestampTz,
    Timestamp,
    Date,
    Json,
    TextArray,
    Bytea,
}

const NATIVE: &[(Type, PgKind)] = &[
    (Type::BOOL, PgKind::Bool),
    (Type::INT2, PgKind::Int2),
    (Type::INT4, PgKind::Int4),
    (Type::INT8, PgKind::Int8),
    (Type::FLOAT4, PgKind::Float4),
    (Type::FLOAT8, PgKind::Float8),
    (Type::NUMERIC, PgKind::Numeric),
    (Type::TEXT, PgKind::Text),
    (Type::VARCHAR, PgKind::Text),
    (Type::BPCHAR, PgKind::Text),
    (Type::NAME, PgKind::Text),
    (Type::UUID, PgKind::Uuid),
    (Type::TIMESTAMPTZ, PgKind::TimestampTz),
    (Type::TIMESTAMP, PgKind::Timestamp),
    (Type::DATE, PgKind::Date),
    (Type::JSON, PgKind::Json),
    (Type::JSONB, PgKind::Json),
    (Type::TEXT_ARRAY, PgKind::TextArray),
    (Type::VARCHAR_ARRAY, PgKind::TextArray),
    (Type::BYTEA, PgKind::Bytea),
];

/// The native binding for `ty`, or `None` when values of that type must
/// travel as text (enums, extension types such as `vector`, inet, ...).
pub fn classify(ty: &Type) -> Option<PgKind> {
    NATIVE
        .iter()
        .find(|(native, _)| native == ty)
        .map(|(_, kind)| *kind)
}

pub fn is_native(ty: &Type) -> bool {
    classify(ty).is_some()
}

/// Schema-qualified, quoted type name for a `CAST(.. AS <type>)`.
pub fn cast_target(ty: &Type, quote: &dyn Fn(&str) -> String) -> String {
    match ty.kind() {
        Kind::Array(inner) => format!("{}[]", cast_target(inner, quote)),
        _ => format!("{}.{}", quote(ty.schema()), quote(ty.name())),
    }
}
