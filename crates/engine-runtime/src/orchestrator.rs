use crate::{
    connection::{ConnectionProvider, Connections, with_handles},
    error::MigrationError,
};
use engine_config::settings::MigrationSettings;
use engine_core::{error::error_chain, metrics::Metrics, reporter::Reporter};
use engine_processing::{
    migrate::{MigratorConfig, TableMigrator},
    transform::context::TransformContext,
};
use model::{
    core::identifiers::RunId,
    execution::report::{MigrationReport, RunState, TableOutcome},
    spec::table::TableSpec,
};
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Connecting,
    RunningTable { index: usize, name: String },
    Reporting,
    Completed,
    Halted,
}

/// Result of running the table list against open connections.
struct TablesRun {
    outcomes: Vec<TableOutcome>,
    halted: bool,
    interrupted: bool,
}

/// Runs table specs in order against one pair of connections and
/// aggregates a `MigrationReport`.
pub struct Orchestrator {
    provider: Arc<dyn ConnectionProvider>,
    reporter: Arc<dyn Reporter>,
    settings: MigrationSettings,
    cancel: CancellationToken,
    metrics: Metrics,
    phases: Mutex<Vec<RunPhase>>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ConnectionProvider>,
        reporter: Arc<dyn Reporter>,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            provider,
            reporter,
            settings,
            cancel: CancellationToken::new(),
            metrics: Metrics::new(),
            phases: Mutex::new(vec![RunPhase::NotStarted]),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn phase(&self) -> RunPhase {
        self.phases()
            .last()
            .cloned()
            .unwrap_or(RunPhase::NotStarted)
    }

    /// Every phase entered so far, in order.
    pub fn phases(&self) -> Vec<RunPhase> {
        self.phases
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn enter(&self, phase: RunPhase) {
        if let Ok(mut phases) = self.phases.lock() {
            phases.push(phase);
        }
    }

    /// Runs every spec in order. Only a connection failure is an `Err`;
    /// table-level failures are recorded in the report.
    pub async fn run_all(&self, specs: &[TableSpec]) -> Result<MigrationReport, MigrationError> {
        if specs.is_empty() {
            return Err(MigrationError::NothingToRun);
        }

        let started = Instant::now();
        let run_id = RunId::generate();
        info!(%run_id, tables = specs.len(), "Starting migration run");

        self.enter(RunPhase::Connecting);
        let run = with_handles(self.provider.as_ref(), async |connections: &Connections| {
            self.run_tables(connections, specs).await
        })
        .await;

        let run = match run {
            Ok(run) => run,
            Err(err) => {
                error!(error = %error_chain(&err), "Could not open connections");
                self.enter(RunPhase::Halted);
                return Err(err.into());
            }
        };

        let state = if run.halted {
            RunState::Halted
        } else {
            RunState::Completed
        };
        self.enter(match state {
            RunState::Completed => RunPhase::Completed,
            RunState::Halted => RunPhase::Halted,
        });

        let report = MigrationReport {
            run_id,
            outcomes: run.outcomes,
            duration: started.elapsed(),
            state,
            interrupted: run.interrupted,
        };
        let snapshot = self.metrics.snapshot();
        info!(
            state = ?report.state,
            tables = report.outcomes.len(),
            rows_read = snapshot.rows_read,
            rows_written = snapshot.rows_written,
            rows_skipped = snapshot.rows_skipped,
            rows_failed = snapshot.rows_failed,
            "Migration run finished"
        );
        Ok(report)
    }

    /// Standalone entry point: connect, migrate one table, disconnect.
    pub async fn run_one(&self, spec: &TableSpec) -> Result<MigrationReport, MigrationError> {
        self.run_all(std::slice::from_ref(spec)).await
    }

    async fn run_tables(&self, connections: &Connections, specs: &[TableSpec]) -> TablesRun {
        let mut run = TablesRun {
            outcomes: Vec::with_capacity(specs.len()),
            halted: false,
            interrupted: false,
        };
        let config = MigratorConfig::from(&self.settings);
        let ctx = TransformContext::from(&self.settings);

        for (index, spec) in specs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    next = %spec.name,
                    remaining = specs.len() - index,
                    "Shutdown requested; not starting further tables"
                );
                run.halted = true;
                run.interrupted = true;
                break;
            }

            self.enter(RunPhase::RunningTable {
                index,
                name: spec.name.clone(),
            });
            info!(
                "Table {}/{}: {} ({})",
                index + 1,
                specs.len(),
                spec.name,
                spec.description
            );
            if !spec.description.is_empty() {
                self.reporter.on_log(&spec.name, &spec.description);
            }

            let migrator = TableMigrator::new(
                connections.source.as_ref(),
                connections.destination.as_ref(),
                self.reporter.as_ref(),
                config,
                ctx.clone(),
            )
            .with_cancellation(self.cancel.clone())
            .with_metrics(self.metrics.clone());

            match migrator.run(spec).await {
                Ok(result) => {
                    let cut_short = !result.completed && self.cancel.is_cancelled();
                    run.outcomes
                        .push(TableOutcome::finished(&spec.name, &spec.description, result));
                    if cut_short {
                        run.halted = true;
                        run.interrupted = true;
                        break;
                    }
                }
                Err(failure) => {
                    let message = error_chain(&failure.error);
                    error!(table = %spec.name, error = %message, "Table failed");
                    run.outcomes.push(TableOutcome::aborted(
                        &spec.name,
                        &spec.description,
                        failure.partial,
                        message,
                    ));

                    if !self.settings.continue_on_error {
                        warn!(table = %spec.name, "Halting: continue-on-error is off");
                        run.halted = true;
                        break;
                    }
                }
            }
        }

        self.enter(RunPhase::Reporting);
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::sql::base::{
        destination::DbDataDestination,
        error::{ConnectorError, DbError},
        source::DbDataSource,
    };
    use engine_core::reporter::MemoryReporter;
    use model::{
        core::value::Value,
        records::row::{FieldValue, RowData, RowKey},
        spec::table::TableRef,
    };
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
    };

    struct TwoRows;

    #[async_trait]
    impl DbDataSource for TwoRows {
        async fn count(&self, _spec: &TableSpec) -> Result<u64, DbError> {
            Ok(2)
        }

        async fn fetch(&self, spec: &TableSpec, offset: u64, limit: usize) -> Result<Vec<RowData>, DbError> {
            Ok((1..=2)
                .map(|id| RowData::new(&spec.name, vec![FieldValue::new("id", Value::Int(id))]))
                .skip(offset as usize)
                .take(limit)
                .collect())
        }
    }

    /// Every destination table exists except `missing`.
    struct Sink;

    #[async_trait]
    impl DbDataDestination for Sink {
        async fn table_exists(&self, table: &TableRef) -> Result<bool, DbError> {
            Ok(table.name != "missing")
        }

        async fn existing_keys(&self, _spec: &TableSpec) -> Result<HashSet<RowKey>, DbError> {
            Ok(HashSet::new())
        }

        async fn write_row(&self, _spec: &TableSpec, _row: &RowData) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        refuse: bool,
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    #[async_trait]
    impl ConnectionProvider for FakeProvider {
        async fn open(&self) -> Result<Connections, ConnectorError> {
            if self.refuse {
                return Err(ConnectorError::InvalidConfig("password authentication failed".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Connections {
                source: Arc::new(TwoRows),
                destination: Arc::new(Sink),
            })
        }

        async fn close(&self, _connections: Connections) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn table(name: &str) -> TableSpec {
        TableSpec::new(name, TableRef::new("public", name), TableRef::new("shop", name))
            .primary_key(&["id"])
            .passthrough(&["id"])
    }

    fn orchestrator(provider: Arc<FakeProvider>, continue_on_error: bool) -> Orchestrator {
        let settings = MigrationSettings {
            continue_on_error,
            ..MigrationSettings::default()
        };
        Orchestrator::new(provider, Arc::new(MemoryReporter::new()), settings)
    }

    #[tokio::test]
    async fn refused_connection_halts_before_any_table() {
        let provider = Arc::new(FakeProvider {
            refuse: true,
            ..Default::default()
        });
        let orchestrator = orchestrator(provider.clone(), false);

        let err = orchestrator.run_all(&[table("a")]).await.unwrap_err();

        assert!(matches!(err, MigrationError::Connection(_)));
        assert_eq!(
            orchestrator.phases(),
            vec![RunPhase::NotStarted, RunPhase::Connecting, RunPhase::Halted]
        );
        assert_eq!(provider.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn table_error_halts_the_run_by_default() {
        let provider = Arc::new(FakeProvider::default());
        let orchestrator = orchestrator(provider.clone(), false);

        let report = orchestrator
            .run_all(&[table("a"), table("missing"), table("c")])
            .await
            .unwrap();

        assert_eq!(report.state, RunState::Halted);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].is_success());
        assert!(report.outcomes[1].error.as_deref().unwrap().contains("shop.missing"));
        assert!(!report.success());
        assert_eq!(orchestrator.phase(), RunPhase::Halted);
        assert_eq!(provider.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn continue_on_error_attempts_every_table() {
        let provider = Arc::new(FakeProvider::default());
        let orchestrator = orchestrator(provider.clone(), true);

        let report = orchestrator
            .run_all(&[table("a"), table("missing"), table("c")])
            .await
            .unwrap();

        assert_eq!(report.state, RunState::Completed);
        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[2].is_success());
        assert!(!report.success());
        assert_eq!(orchestrator.metrics().snapshot().rows_written, 4);
        assert_eq!(
            orchestrator.phases()[2],
            RunPhase::RunningTable {
                index: 0,
                name: "a".into()
            }
        );
        assert_eq!(provider.opened.load(Ordering::SeqCst), 1);
        assert_eq!(provider.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_next_table() {
        let provider = Arc::new(FakeProvider::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let orchestrator = orchestrator(provider.clone(), false).with_cancellation(cancel);

        let report = orchestrator.run_all(&[table("a"), table("b")]).await.unwrap();

        assert!(report.interrupted);
        assert_eq!(report.state, RunState::Halted);
        assert!(report.outcomes.is_empty());
        assert_eq!(provider.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_one_reports_a_single_table() {
        let orchestrator = orchestrator(Arc::new(FakeProvider::default()), false);

        let report = orchestrator.run_one(&table("a")).await.unwrap();

        assert!(report.success());
        assert_eq!(report.totals().succeeded, 2);
    }

    #[tokio::test]
    async fn empty_table_list_is_rejected() {
        let orchestrator = orchestrator(Arc::new(FakeProvider::default()), false);
        assert!(matches!(
            orchestrator.run_all(&[]).await,
            Err(MigrationError::NothingToRun)
        ));
    }
}
