use bytes::BytesMut;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn new<T: ToSql + Sync + Send + 'static>(value: T) -> Self {
        PgParam(Box::new(value))
    }

    pub fn null() -> Self {
        PgParam(Box::new(SqlNull))
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

impl std::fmt::Debug for PgParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

/// `NULL` for a parameter of any type. A typed `Option::<T>::None` is
/// rejected by the driver when `T` does not accept the column's type.
#[derive(Debug, Clone, Copy)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(&self, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[derive(Debug, Default)]
pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn new(params: Vec<PgParam>) -> Self {
        Self { params }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}
