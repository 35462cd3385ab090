use crate::sql::base::error::DbError;
use async_trait::async_trait;
use model::{
    records::row::{RowData, RowKey},
    spec::table::{TableRef, TableSpec},
};
use std::collections::HashSet;

/// Write side of a table copy.
#[async_trait]
pub trait DbDataDestination: Send + Sync {
    async fn table_exists(&self, table: &TableRef) -> Result<bool, DbError>;

    /// Text-normalized primary keys of every destination row.
    async fn existing_keys(&self, spec: &TableSpec) -> Result<HashSet<RowKey>, DbError>;

    /// Writes one transformed row according to the spec's write mode.
    async fn write_row(&self, spec: &TableSpec, row: &RowData) -> Result<(), DbError>;
}
