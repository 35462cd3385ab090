use crate::sql::{
    base::{error::DbError, source::DbDataSource},
    postgres::{adapter::PgAdapter, data_type::is_native, row::to_row_data},
};
use async_trait::async_trait;
use model::{records::row::RowData, spec::table::TableSpec};
use planner::query::builder::table::TableStatements;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::Mutex;
use tokio_postgres::Statement;
use tracing::{debug, info};

/// Prepared page query for one spec.
struct SourcePlan {
    page: Statement,
}

pub struct PgSource {
    adapter: PgAdapter,
    plans: Mutex<HashMap<String, Arc<SourcePlan>>>,
}

impl PgSource {
    pub fn new(adapter: PgAdapter) -> Self {
        Self {
            adapter,
            plans: Mutex::new(HashMap::new()),
        }
    }

    pub fn adapter(&self) -> &PgAdapter {
        &self.adapter
    }

    async fn plan(&self, spec: &TableSpec) -> Result<Arc<SourcePlan>, DbError> {
        let mut plans = self.plans.lock().await;
        if let Some(plan) = plans.get(&spec.name) {
            return Ok(plan.clone());
        }

        let statements = TableStatements::new(spec, self.adapter.dialect());

        // Prepare without executing to learn each column's type.
        let described = self.adapter.prepare(&statements.describe_source()).await?;
        let as_text: HashSet<String> = described
            .columns()
            .iter()
            .filter(|c| !is_native(c.type_()))
            .map(|c| c.name().to_ascii_lowercase())
            .collect();
        if !as_text.is_empty() {
            info!(table = %spec.name, columns = ?as_text, "Reading non-native columns as text");
        }

        let page = self.adapter.prepare(&statements.select_page(&as_text)).await?;
        let plan = Arc::new(SourcePlan { page });
        plans.insert(spec.name.clone(), plan.clone());
        Ok(plan)
    }
}

#[async_trait]
impl DbDataSource for PgSource {
    async fn count(&self, spec: &TableSpec) -> Result<u64, DbError> {
        let sql = TableStatements::new(spec, self.adapter.dialect()).count();
        let row = self.adapter.client().query_one(sql.as_str(), &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }

    async fn fetch(
        &self,
        spec: &TableSpec,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<RowData>, DbError> {
        let plan = self.plan(spec).await?;
        let limit = limit as i64;
        let offset = offset as i64;
        debug!(table = %spec.name, offset, limit, "Fetching page");

        let rows = self
            .adapter
            .client()
            .query(&plan.page, &[&limit, &offset])
            .await?;
        rows.iter()
            .map(|row| to_row_data(row, &spec.name))
            .collect()
    }
}
