use crate::sql::{
    base::{adapter::SqlAdapter, destination::DbDataDestination, error::DbError},
    postgres::{
        adapter::PgAdapter,
        coercion,
        data_type::{cast_target, is_native},
        params::{PgParam, PgParamStore},
        row::to_row_data,
    },
};
use async_trait::async_trait;
use model::{
    records::row::{RowData, RowKey},
    spec::table::{TableRef, TableSpec},
};
use planner::query::{builder::table::TableStatements, dialect::Dialect};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::Mutex;
use tokio_postgres::{Statement, types::Type};
use tracing::info;

/// Prepared upsert for one spec, with the parameter types the server expects.
struct WritePlan {
    statement: Statement,
    columns: Vec<String>,
    param_types: Vec<Type>,
}

pub struct PgDestination {
    adapter: PgAdapter,
    plans: Mutex<HashMap<String, Arc<WritePlan>>>,
}

impl PgDestination {
    pub fn new(adapter: PgAdapter) -> Self {
        Self {
            adapter,
            plans: Mutex::new(HashMap::new()),
        }
    }

    pub fn adapter(&self) -> &PgAdapter {
        &self.adapter
    }

    async fn plan(&self, spec: &TableSpec) -> Result<Arc<WritePlan>, DbError> {
        let mut plans = self.plans.lock().await;
        if let Some(plan) = plans.get(&spec.name) {
            return Ok(plan.clone());
        }

        let dialect = self.adapter.dialect();
        let statements = TableStatements::new(spec, dialect);
        let mut statement = self.adapter.prepare(&statements.upsert(&[])).await?;

        let quote = |s: &str| dialect.quote_identifier(s);
        let casts: Vec<Option<String>> = statement
            .params()
            .iter()
            .map(|ty| (!is_native(ty)).then(|| cast_target(ty, &quote)))
            .collect();

        if casts.iter().any(Option::is_some) {
            info!(
                table = %spec.name,
                casts = ?casts.iter().flatten().collect::<Vec<_>>(),
                "Binding non-native columns as text"
            );
            statement = self.adapter.prepare(&statements.upsert(&casts)).await?;
        }

        let plan = Arc::new(WritePlan {
            param_types: statement.params().to_vec(),
            columns: spec.destination_columns(),
            statement,
        });
        plans.insert(spec.name.clone(), plan.clone());
        Ok(plan)
    }
}

#[async_trait]
impl DbDataDestination for PgDestination {
    async fn table_exists(&self, table: &TableRef) -> Result<bool, DbError> {
        self.adapter.table_exists(table).await
    }

    async fn existing_keys(&self, spec: &TableSpec) -> Result<HashSet<RowKey>, DbError> {
        let sql = TableStatements::new(spec, self.adapter.dialect()).select_destination_keys();
        let rows = self.adapter.client().query(sql.as_str(), &[]).await?;
        rows.iter()
            .map(|row| {
                to_row_data(row, &spec.name).map(|data| data.key(&spec.primary_key).normalized())
            })
            .collect()
    }

    async fn write_row(&self, spec: &TableSpec, row: &RowData) -> Result<(), DbError> {
        let plan = self.plan(spec).await?;
        if plan.param_types.len() != plan.columns.len() {
            return Err(DbError::ParamCount {
                expected: plan.param_types.len(),
                found: plan.columns.len(),
            });
        }

        let params = plan
            .columns
            .iter()
            .zip(plan.param_types.iter())
            .map(|(column, ty)| coercion::coerce(column, &row.get_value(column), ty))
            .collect::<Result<Vec<PgParam>, DbError>>()?;
        let store = PgParamStore::new(params);

        self.adapter
            .client()
            .execute(&plan.statement, &store.as_refs())
            .await?;
        Ok(())
    }
}
