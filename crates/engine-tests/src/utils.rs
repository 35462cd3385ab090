#![allow(dead_code)]

use crate::memory::{MemoryDestination, MemoryProvider, MemorySource};
use chrono::{DateTime, Utc};
use engine_config::settings::MigrationSettings;
use engine_core::reporter::{MemoryReporter, Reporter};
use engine_runtime::orchestrator::Orchestrator;
use model::{core::value::Value, spec::table::TableSpec};
use std::sync::Arc;

pub const STORAGE: &str = "https://ylooqmqmoufqtxvetxuj.supabase.co/storage/v1/object/public";

/// Both in-memory databases, the provider over them and a recording reporter.
pub struct Harness {
    pub source: Arc<MemorySource>,
    pub destination: Arc<MemoryDestination>,
    pub provider: Arc<MemoryProvider>,
    pub reporter: Arc<MemoryReporter>,
}

impl Harness {
    pub fn new() -> Self {
        let source = Arc::new(MemorySource::new());
        let destination = Arc::new(MemoryDestination::new());
        Self {
            provider: Arc::new(MemoryProvider::new(source.clone(), destination.clone())),
            source,
            destination,
            reporter: Arc::new(MemoryReporter::new()),
        }
    }

    /// Creates empty source and destination tables for every spec.
    pub fn with_tables(self, specs: &[TableSpec]) -> Self {
        for spec in specs {
            self.source.insert(&spec.source.table, Vec::new());
            self.destination.create_table(&spec.destination);
        }
        self
    }

    pub fn orchestrator(&self, continue_on_error: bool) -> Orchestrator {
        self.orchestrator_with(self.reporter.clone(), continue_on_error)
    }

    pub fn orchestrator_with(&self, reporter: Arc<dyn Reporter>, continue_on_error: bool) -> Orchestrator {
        Orchestrator::new(self.provider.clone(), reporter, settings(continue_on_error))
    }
}

pub fn settings(continue_on_error: bool) -> MigrationSettings {
    MigrationSettings {
        batch_size: 2,
        continue_on_error,
        ..MigrationSettings::default()
    }
}

pub fn ts(rfc3339: &str) -> Value {
    Value::Timestamp(
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc),
    )
}

pub fn text(value: &str) -> Value {
    Value::from(value)
}

pub fn storage_url(path: &str) -> String {
    format!("{STORAGE}/{path}")
}
