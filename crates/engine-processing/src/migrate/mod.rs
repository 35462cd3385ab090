use crate::{
    migrate::error::{MigrateError, RowError, TableFailure},
    transform::{RecordTransformer, context::TransformContext},
};
use connectors::sql::base::{destination::DbDataDestination, source::DbDataSource};
use engine_config::settings::MigrationSettings;
use engine_core::{
    error::error_chain, metrics::Metrics, progress::ProgressThrottle, reporter::Reporter,
};
use model::{
    execution::{failed_row::FailedRow, run_result::RunResult},
    records::row::{RowData, RowKey},
    spec::table::{TableSpec, WriteMode},
};
use std::{
    collections::HashSet,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod error;

/// Row id used when reporting an error that stopped the whole table.
pub const TABLE_ROW_ID: &str = "(table)";

#[derive(Debug, Clone, Copy)]
pub struct MigratorConfig {
    pub batch_size: usize,
    pub row_timeout: Duration,
    pub progress: ProgressThrottle,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self::from(&MigrationSettings::default())
    }
}

impl From<&MigrationSettings> for MigratorConfig {
    fn from(settings: &MigrationSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            row_timeout: settings.row_timeout,
            progress: ProgressThrottle::default(),
        }
    }
}

/// What happened to one source row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Written,
    /// Key already present in the destination (skip-existing mode).
    Skipped,
    Failed(FailedRow),
}

impl RowOutcome {
    /// Folds this outcome into the table's running result.
    pub fn record(self, result: &mut RunResult) {
        match self {
            RowOutcome::Written => result.record_success(),
            RowOutcome::Skipped => result.record_skip(),
            RowOutcome::Failed(failure) => result.record_failure(failure),
        }
    }
}

/// Folds a sequence of row outcomes into a fresh result.
pub fn fold_outcomes(
    table: &str,
    total: u64,
    outcomes: impl IntoIterator<Item = RowOutcome>,
) -> RunResult {
    outcomes
        .into_iter()
        .fold(RunResult::new(table, total), |mut result, outcome| {
            outcome.record(&mut result);
            result
        })
}

/// Copies one table: count, page in order, transform, then write or skip
/// each row. Row failures are recorded and never stop the table.
pub struct TableMigrator<'a> {
    source: &'a dyn DbDataSource,
    destination: &'a dyn DbDataDestination,
    reporter: &'a dyn Reporter,
    config: MigratorConfig,
    ctx: TransformContext,
    cancel: CancellationToken,
    metrics: Metrics,
}

impl<'a> TableMigrator<'a> {
    pub fn new(
        source: &'a dyn DbDataSource,
        destination: &'a dyn DbDataDestination,
        reporter: &'a dyn Reporter,
        config: MigratorConfig,
        ctx: TransformContext,
    ) -> Self {
        Self {
            source,
            destination,
            reporter,
            config,
            ctx,
            cancel: CancellationToken::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Migrates `spec` and always closes the table with `on_finish`. On a
    /// table-level error the failure carries the rows handled so far.
    pub async fn run(&self, spec: &TableSpec) -> Result<RunResult, TableFailure> {
        let started = Instant::now();
        let table = spec.name.as_str();
        let mut slot = None;

        match self.migrate(spec, &mut slot).await {
            Ok(()) => {
                let result = slot
                    .unwrap_or_else(|| RunResult::empty(table))
                    .finish(started.elapsed());
                self.reporter.on_finish(table, &result);
                Ok(result)
            }
            Err(error) => {
                self.reporter.on_error(table, TABLE_ROW_ID, &error);
                let counted = slot.is_some();
                let mut result = slot.unwrap_or_else(|| RunResult::new(table, 0));
                result.error = Some(error_chain(&error));
                let result = result.finish(started.elapsed());
                self.reporter.on_finish(table, &result);
                Err(TableFailure {
                    error,
                    partial: counted.then_some(result),
                })
            }
        }
    }

    async fn migrate(
        &self,
        spec: &TableSpec,
        slot: &mut Option<RunResult>,
    ) -> Result<(), MigrateError> {
        let table = spec.name.as_str();
        spec.validate()?;

        let exists = self
            .destination
            .table_exists(&spec.destination)
            .await
            .map_err(|source| MigrateError::DestinationCheck {
                destination: spec.destination.clone(),
                source,
            })?;
        if !exists {
            return Err(MigrateError::MissingDestinationTable {
                destination: spec.destination.clone(),
            });
        }

        self.reporter
            .on_log(table, &format!("Counting rows in {}", spec.source.table));
        let total = self
            .source
            .count(spec)
            .await
            .map_err(|source| MigrateError::Count {
                table: spec.source.table.clone(),
                source,
            })?;
        self.reporter
            .on_log(table, &format!("Rows to migrate: {total}"));

        if total == 0 {
            self.reporter.on_log(table, "Nothing to migrate");
            *slot = Some(RunResult::empty(table));
            return Ok(());
        }
        let result = slot.insert(RunResult::new(table, total));

        let mut existing = match spec.mode {
            WriteMode::Upsert => None,
            WriteMode::SkipExisting => {
                let keys = self.destination.existing_keys(spec).await.map_err(|source| {
                    MigrateError::ExistingKeys {
                        table: spec.destination.clone(),
                        source,
                    }
                })?;
                self.reporter.on_log(
                    table,
                    &format!("{} rows already present in {}", keys.len(), spec.destination),
                );
                Some(keys)
            }
        };

        let transformer = RecordTransformer::for_spec(spec, &self.ctx);
        let mut offset = 0u64;

        info!(
            table,
            total,
            batch_size = self.config.batch_size,
            mode = ?spec.mode,
            "Migrating {} -> {}",
            spec.source.table,
            spec.destination
        );

        'pages: while result.processed() < total {
            if self.cancel.is_cancelled() {
                break;
            }

            let remaining = total - result.processed();
            let limit = (self.config.batch_size as u64).min(remaining) as usize;
            let rows = self
                .source
                .fetch(spec, offset, limit)
                .await
                .map_err(|source| MigrateError::Fetch {
                    table: spec.source.table.clone(),
                    offset,
                    source,
                })?;
            self.metrics.increment_pages(1);
            self.metrics.increment_read(rows.len() as u64);
            debug!(table, offset, rows = rows.len(), "Fetched page");

            if rows.is_empty() {
                let message = format!(
                    "Source returned {} of {} counted rows; the table shrank during the run",
                    result.processed(),
                    total
                );
                warn!(table, "{message}");
                self.reporter.on_warning(table, &message);
                result.total = result.processed();
                break;
            }
            offset += rows.len() as u64;

            for row in &rows {
                if self.cancel.is_cancelled() {
                    break 'pages;
                }

                let outcome = self.migrate_row(spec, &transformer, row, existing.as_mut()).await;
                self.count_outcome(&outcome);
                outcome.record(result);

                let current = result.processed();
                if self.config.progress.should_report(current, result.total) {
                    self.reporter.on_progress(table, current, result.total);
                }
            }
        }

        if self.cancel.is_cancelled() && result.processed() < result.total {
            let message = format!(
                "Cancelled after {} of {} rows",
                result.processed(),
                result.total
            );
            warn!(table, "{message}");
            self.reporter.on_warning(table, &message);
        }

        Ok(())
    }

    async fn migrate_row(
        &self,
        spec: &TableSpec,
        transformer: &RecordTransformer,
        row: &RowData,
        existing: Option<&mut HashSet<RowKey>>,
    ) -> RowOutcome {
        let label = row_label(spec, row);

        let transformed = match transformer.transform(row) {
            Ok(transformed) => transformed,
            Err(err) => return self.fail(spec, &label, RowError::Transform(err)),
        };
        for warning in &transformed.warnings {
            self.reporter
                .on_warning(&spec.name, &format!("{label}: {warning}"));
        }

        let key = transformed.row.key(&spec.primary_key).normalized();
        if let Some(existing) = &existing
            && existing.contains(&key)
        {
            debug!(table = %spec.name, row = %label, "Already present; skipping");
            return RowOutcome::Skipped;
        }

        let write = self.destination.write_row(spec, &transformed.row);
        match tokio::time::timeout(self.config.row_timeout, write).await {
            Ok(Ok(())) => {
                if let Some(existing) = existing {
                    existing.insert(key);
                }
                RowOutcome::Written
            }
            Ok(Err(err)) => self.fail(spec, &label, RowError::Write(err)),
            Err(_) => self.fail(spec, &label, RowError::Timeout(self.config.row_timeout)),
        }
    }

    fn fail(&self, spec: &TableSpec, label: &str, err: RowError) -> RowOutcome {
        self.reporter.on_error(&spec.name, label, &err);
        RowOutcome::Failed(FailedRow::new(
            &spec.name,
            label,
            err.stage(),
            error_chain(&err),
        ))
    }

    fn count_outcome(&self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Written => self.metrics.increment_written(1),
            RowOutcome::Skipped => self.metrics.increment_skipped(1),
            RowOutcome::Failed(_) => self.metrics.increment_failed(1),
        }
    }
}

/// Row identifier for logs: the first non-empty label column, else the key.
fn row_label(spec: &TableSpec, row: &RowData) -> String {
    row.label(&spec.row_label)
        .or_else(|| row.label(&spec.source_key_columns()))
        .unwrap_or_else(|| format!("#{}", row.key(&spec.source_key_columns())))
}
