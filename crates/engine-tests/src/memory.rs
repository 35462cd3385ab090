//! In-memory stand-ins for the source and destination databases.

use async_trait::async_trait;
use connectors::sql::base::{
    destination::DbDataDestination,
    error::{ConnectorError, DbError},
    source::DbDataSource,
};
use engine_runtime::connection::{ConnectionProvider, Connections};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData, RowKey},
    spec::table::{TableRef, TableSpec, WriteMode},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Source tables keyed by their qualified name. Rows are served in
/// insertion order, which fixtures keep sorted by `created_at`.
#[derive(Default)]
pub struct MemorySource {
    tables: Mutex<HashMap<String, Vec<RowData>>>,
    /// Reads at or past this offset fail as if the connection dropped.
    broken_from: Mutex<HashMap<String, u64>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: &TableRef, rows: Vec<RowData>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn break_reads_from(&self, table: &TableRef, offset: u64) {
        self.broken_from
            .lock()
            .unwrap()
            .insert(table.to_string(), offset);
    }

    fn rows(&self, table: &TableRef) -> Result<Vec<RowData>, DbError> {
        self.tables
            .lock()
            .unwrap()
            .get(&table.to_string())
            .cloned()
            .ok_or_else(|| DbError::Unknown(format!("relation \"{table}\" does not exist")))
    }
}

#[async_trait]
impl DbDataSource for MemorySource {
    async fn count(&self, spec: &TableSpec) -> Result<u64, DbError> {
        Ok(self.rows(&spec.source.table)?.len() as u64)
    }

    async fn fetch(&self, spec: &TableSpec, offset: u64, limit: usize) -> Result<Vec<RowData>, DbError> {
        let broken = self
            .broken_from
            .lock()
            .unwrap()
            .get(&spec.source.table.to_string())
            .copied();
        if broken.is_some_and(|from| offset >= from) {
            return Err(DbError::Unknown(
                "server closed the connection unexpectedly".into(),
            ));
        }
        Ok(self
            .rows(&spec.source.table)?
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }
}

/// Destination tables with primary-key upsert semantics.
#[derive(Default)]
pub struct MemoryDestination {
    tables: Mutex<HashMap<String, Vec<RowData>>>,
    /// `(table, key text)` pairs whose writes fail like a constraint violation.
    rejected: Mutex<HashSet<(String, String)>>,
    writes: AtomicUsize,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, table: &TableRef) {
        self.tables.lock().unwrap().entry(table.to_string()).or_default();
    }

    pub fn seed(&self, table: &TableRef, rows: Vec<RowData>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn reject(&self, table: &TableRef, key: &str) {
        self.rejected
            .lock()
            .unwrap()
            .insert((table.to_string(), key.to_string()));
    }

    pub fn rows(&self, table: &TableRef) -> Vec<RowData> {
        self.tables
            .lock()
            .unwrap()
            .get(&table.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn row(&self, table: &TableRef, column: &str, value: &str) -> Option<RowData> {
        self.rows(table)
            .into_iter()
            .find(|row| row.get_value(column).to_text().as_deref() == Some(value))
    }

    /// Write attempts that reached the table, including no-op skips.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DbDataDestination for MemoryDestination {
    async fn table_exists(&self, table: &TableRef) -> Result<bool, DbError> {
        Ok(self.tables.lock().unwrap().contains_key(&table.to_string()))
    }

    async fn existing_keys(&self, spec: &TableSpec) -> Result<HashSet<RowKey>, DbError> {
        Ok(self
            .rows(&spec.destination)
            .iter()
            .map(|row| row.key(&spec.primary_key).normalized())
            .collect())
    }

    async fn write_row(&self, spec: &TableSpec, row: &RowData) -> Result<(), DbError> {
        let name = spec.destination.to_string();
        let key = row.key(&spec.primary_key).normalized();

        if self
            .rejected
            .lock()
            .unwrap()
            .contains(&(name.clone(), key.to_string()))
        {
            return Err(DbError::Unknown(format!(
                "new row for relation \"{}\" violates check constraint",
                spec.destination.name
            )));
        }

        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(&name)
            .ok_or_else(|| DbError::Unknown(format!("relation \"{name}\" does not exist")))?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        let existing = table
            .iter()
            .position(|r| r.key(&spec.primary_key).normalized() == key);
        match (existing, spec.mode) {
            (None, _) => table.push(row.clone()),
            (Some(_), WriteMode::SkipExisting) => {}
            (Some(index), WriteMode::Upsert) => {
                for column in spec.update_columns() {
                    table[index].set(&column, row.get_value(&column));
                }
            }
        }
        Ok(())
    }
}

/// Hands out the same in-memory pair on every `open`.
pub struct MemoryProvider {
    pub source: Arc<MemorySource>,
    pub destination: Arc<MemoryDestination>,
    refuse: Option<String>,
    closed: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(source: Arc<MemorySource>, destination: Arc<MemoryDestination>) -> Self {
        Self {
            source,
            destination,
            refuse: None,
            closed: AtomicUsize::new(0),
        }
    }

    /// Every `open` fails with `reason`.
    pub fn refusing(reason: &str) -> Self {
        Self {
            refuse: Some(reason.to_string()),
            ..Self::new(Arc::default(), Arc::default())
        }
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionProvider for MemoryProvider {
    async fn open(&self) -> Result<Connections, ConnectorError> {
        if let Some(reason) = &self.refuse {
            return Err(ConnectorError::InvalidConfig(reason.clone()));
        }
        Ok(Connections {
            source: self.source.clone(),
            destination: self.destination.clone(),
        })
    }

    async fn close(&self, _connections: Connections) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A row carrying every source column of `spec`, `NULL` unless overridden.
pub fn source_row(spec: &TableSpec, values: &[(&str, Value)]) -> RowData {
    let mut row = RowData::new(
        &spec.name,
        spec.source_columns()
            .into_iter()
            .map(|c| FieldValue::new(c, Value::Null))
            .collect(),
    );
    for (column, value) in values {
        row.set(column, value.clone());
    }
    row
}
