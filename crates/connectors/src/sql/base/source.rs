use crate::sql::base::error::DbError;
use async_trait::async_trait;
use model::{records::row::RowData, spec::table::TableSpec};

/// Read side of a table copy. Rows come back in the spec's deterministic
/// order (sort key, then primary key).
#[async_trait]
pub trait DbDataSource: Send + Sync {
    async fn count(&self, spec: &TableSpec) -> Result<u64, DbError>;

    async fn fetch(
        &self,
        spec: &TableSpec,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<RowData>, DbError>;
}
