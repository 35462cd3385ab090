use crate::sql::{
    base::{
        adapter::SqlAdapter,
        config::ConnectionConfig,
        error::{ConnectorError, DbError},
    },
    postgres::{
        coercion,
        params::{PgParam, PgParamStore},
        row::to_row_data,
        utils::connect_client,
    },
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData, spec::table::TableRef};
use planner::query::{builder::table::TableStatements, dialect};
use std::sync::Arc;
use tokio_postgres::{Client, Statement};
use tracing::debug;

#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<Client>,
    dialect: dialect::Postgres,
    endpoint: String,
}

impl PgAdapter {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn dialect(&self) -> &dialect::Postgres {
        &self.dialect
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn prepare(&self, sql: &str) -> Result<Statement, DbError> {
        debug!(sql, "Preparing statement");
        Ok(self.client.prepare(sql).await?)
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    async fn connect(config: &ConnectionConfig) -> Result<Self, ConnectorError> {
        let client = Arc::new(connect_client(config).await?);
        Ok(PgAdapter {
            client,
            dialect: dialect::Postgres,
            endpoint: config.endpoint(),
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn exec(&self, query: &str) -> Result<(), DbError> {
        self.client.batch_execute(query).await?;
        Ok(())
    }

    async fn query_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<RowData>, DbError> {
        let statement = self.prepare(sql).await?;
        if params.len() != statement.params().len() {
            return Err(DbError::ParamCount {
                expected: statement.params().len(),
                found: params.len(),
            });
        }

        let bound = statement
            .params()
            .iter()
            .zip(params.iter())
            .enumerate()
            .map(|(i, (ty, value))| coercion::coerce(&format!("${}", i + 1), value, ty))
            .collect::<Result<Vec<PgParam>, DbError>>()?;

        let store = PgParamStore::new(bound);
        let rows = self.client.query(&statement, &store.as_refs()).await?;
        rows.iter().map(|row| to_row_data(row, "")).collect()
    }

    async fn table_exists(&self, table: &TableRef) -> Result<bool, DbError> {
        let (sql, params) = TableStatements::table_exists(table, &self.dialect);
        Ok(!self.query_rows(&sql, params).await?.is_empty())
    }
}
