use crate::execution::failed_row::FailedRow;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of migrating one table.
///
/// For a completed table `succeeded + failed == total`. A cancelled table
/// only accounts for the rows it attempted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunResult {
    pub table: String,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Rows counted as succeeded because their key already existed.
    pub skipped: u64,
    pub failures: Vec<FailedRow>,
    pub duration: Duration,
    pub completed: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl RunResult {
    pub fn new(table: &str, total: u64) -> Self {
        Self {
            table: table.to_string(),
            total,
            ..Default::default()
        }
    }

    pub fn empty(table: &str) -> Self {
        Self {
            completed: true,
            ..Self::new(table, 0)
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_skip(&mut self) {
        self.succeeded += 1;
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, failure: FailedRow) {
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.error.is_some()
    }

    /// Percentage of `total` that succeeded; `0.0` when nothing was read.
    pub fn success_rate(&self) -> f64 {
        success_rate(self.succeeded, self.total)
    }

    pub fn finish(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self.completed = self.error.is_none() && self.processed() == self.total;
        self
    }
}

pub fn success_rate(succeeded: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        succeeded as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::failed_row::ProcessingStage;

    #[test]
    fn skips_count_as_successes() {
        let mut result = RunResult::new("user_roles", 3);
        result.record_success();
        result.record_skip();
        result.record_success();
        let result = result.finish(Duration::from_millis(5));

        assert_eq!(result.succeeded, 3);
        assert_eq!(result.skipped, 1);
        assert!(result.completed);
        assert!(!result.has_failures());
    }

    #[test]
    fn partial_run_is_not_completed() {
        let mut result = RunResult::new("products", 10);
        result.record_success();
        result.record_failure(FailedRow::new(
            "products",
            "p-1",
            ProcessingStage::Load,
            "duplicate key".into(),
        ));
        let result = result.finish(Duration::ZERO);

        assert!(!result.completed);
        assert_eq!(result.processed(), 2);
        assert_eq!(result.success_rate(), 10.0);
    }

    #[test]
    fn empty_table_is_complete() {
        let result = RunResult::empty("users");
        assert!(result.completed);
        assert_eq!(result.success_rate(), 0.0);
    }
}
