use crate::{
    core::identifiers::RunId,
    execution::run_result::{RunResult, success_rate},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunState {
    Completed,
    Halted,
}

/// What happened to one attempted table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableOutcome {
    pub name: String,
    pub description: String,
    /// Present when the table ran to the end, even with row failures, or
    /// when it stopped after its rows were counted.
    pub result: Option<RunResult>,
    /// Table-level error that stopped the table.
    pub error: Option<String>,
}

impl TableOutcome {
    pub fn finished(name: &str, description: &str, result: RunResult) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(name: &str, description: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            result: None,
            error: Some(error),
        }
    }

    /// A table stopped by `error`, keeping whatever it managed before.
    pub fn aborted(
        name: &str,
        description: &str,
        partial: Option<RunResult>,
        error: String,
    ) -> Self {
        Self {
            result: partial,
            ..Self::failed(name, description, error)
        }
    }

    pub fn is_success(&self) -> bool {
        match (&self.result, &self.error) {
            (Some(result), None) => result.completed && !result.has_failures(),
            _ => false,
        }
    }
}

/// Final, immutable record of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationReport {
    pub run_id: RunId,
    pub outcomes: Vec<TableOutcome>,
    pub duration: Duration,
    pub state: RunState,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl MigrationReport {
    /// True iff the run completed and every table completed without row failures.
    pub fn success(&self) -> bool {
        self.state == RunState::Completed
            && !self.interrupted
            && self.outcomes.iter().all(TableOutcome::is_success)
    }

    pub fn totals(&self) -> Totals {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref())
            .fold(Totals::default(), |acc, r| Totals {
                total: acc.total + r.total,
                succeeded: acc.succeeded + r.succeeded,
                failed: acc.failed + r.failed,
                skipped: acc.skipped + r.skipped,
            })
    }

    pub fn success_rate(&self) -> f64 {
        let totals = self.totals();
        success_rate(totals.succeeded, totals.total)
    }

    /// Human-readable summary block.
    pub fn render_summary(&self) -> String {
        let rule = "=".repeat(50);
        let mut out = String::new();
        out.push_str(&format!("\n{rule}\nMigration summary (run {})\n{rule}\n", self.run_id));

        for outcome in &self.outcomes {
            let mark = if outcome.is_success() { "OK  " } else { "FAIL" };
            out.push_str(&format!("[{mark}] {}\n", outcome.name));
            if let Some(result) = &outcome.result {
                out.push_str(&format!(
                    "       succeeded: {}, failed: {}, total: {}",
                    result.succeeded, result.failed, result.total
                ));
                if result.skipped > 0 {
                    out.push_str(&format!(", skipped: {}", result.skipped));
                }
                out.push('\n');
            }
            if let Some(error) = &outcome.error {
                out.push_str(&format!("       error: {error}\n"));
            }
        }

        let totals = self.totals();
        out.push_str(&format!("{rule}\n"));
        out.push_str(&format!("Total records processed: {}\n", totals.total));
        out.push_str(&format!(
            "Succeeded: {} ({:.1}%)\n",
            totals.succeeded,
            self.success_rate()
        ));
        out.push_str(&format!("Failed: {}\n", totals.failed));
        out.push_str(&format!("Duration: {:.2}s\n", self.duration.as_secs_f64()));
        let verdict = match (self.state, self.success()) {
            (RunState::Halted, _) => "Migration halted",
            (RunState::Completed, true) => "Migration completed successfully",
            (RunState::Completed, false) => "Migration completed with errors, check the logs",
        };
        out.push_str(&format!("{verdict}\n{rule}\n"));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total: u64, ok: u64) -> RunResult {
        let mut r = RunResult::new("t", total);
        r.succeeded = ok;
        r.failed = total - ok;
        r.finish(Duration::from_secs(1))
    }

    fn report(outcomes: Vec<TableOutcome>, state: RunState) -> MigrationReport {
        MigrationReport {
            run_id: RunId::new("r1"),
            outcomes,
            duration: Duration::from_millis(1234),
            state,
            interrupted: false,
        }
    }

    #[test]
    fn row_failures_make_the_run_unsuccessful() {
        let clean = report(
            vec![TableOutcome::finished("users", "", result(3, 3))],
            RunState::Completed,
        );
        assert!(clean.success());

        let dirty = report(
            vec![
                TableOutcome::finished("users", "", result(3, 3)),
                TableOutcome::finished("products", "", result(4, 3)),
            ],
            RunState::Completed,
        );
        assert!(!dirty.success());
        assert_eq!(
            dirty.totals(),
            Totals {
                total: 7,
                succeeded: 6,
                failed: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn halted_run_is_never_successful() {
        let halted = report(
            vec![TableOutcome::finished("users", "", result(1, 1))],
            RunState::Halted,
        );
        assert!(!halted.success());
    }

    #[test]
    fn summary_formats_rate_and_duration() {
        let r = report(
            vec![
                TableOutcome::finished("users", "", result(3, 2)),
                TableOutcome::failed("shops", "", "relation does not exist".into()),
            ],
            RunState::Completed,
        );
        let summary = r.render_summary();
        assert!(summary.contains("Succeeded: 2 (66.7%)"));
        assert!(summary.contains("Duration: 1.23s"));
        assert!(summary.contains("[FAIL] shops"));
        assert!(summary.contains("error: relation does not exist"));
    }

    #[test]
    fn aborted_table_still_counts_its_rows() {
        let mut partial = RunResult::new("tags", 3);
        partial.succeeded = 2;
        partial.error = Some("connection reset".into());
        let r = report(
            vec![TableOutcome::aborted(
                "tags",
                "",
                Some(partial.finish(Duration::ZERO)),
                "connection reset".into(),
            )],
            RunState::Halted,
        );

        assert!(!r.outcomes[0].is_success());
        assert_eq!((r.totals().total, r.totals().succeeded), (3, 2));
        let summary = r.render_summary();
        assert!(summary.contains("succeeded: 2, failed: 0, total: 3"));
        assert!(summary.contains("error: connection reset"));
    }
}
