use crate::sql::base::{
    config::ConnectionConfig,
    error::{ConnectorError, DbError},
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData, spec::table::TableRef};

#[async_trait]
pub trait SqlAdapter {
    async fn connect(config: &ConnectionConfig) -> Result<Self, ConnectorError>
    where
        Self: Sized;

    /// Round-trips `SELECT 1`.
    async fn ping(&self) -> Result<(), DbError>;

    async fn exec(&self, query: &str) -> Result<(), DbError>;

    async fn query_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<RowData>, DbError>;

    async fn table_exists(&self, table: &TableRef) -> Result<bool, DbError>;
}
