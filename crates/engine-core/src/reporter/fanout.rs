use crate::reporter::Reporter;
use model::execution::run_result::RunResult;
use std::{error::Error, sync::Arc};

/// Forwards every event to each inner reporter, in order.
///
/// The CLI needs only `FileReporter`, which already mirrors events to
/// `tracing`. This exists for tests that record events in memory while
/// also writing table logs.
#[derive(Clone, Default)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl FanoutReporter {
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn with(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

impl Reporter for FanoutReporter {
    fn on_log(&self, table: &str, message: &str) {
        self.reporters.iter().for_each(|r| r.on_log(table, message));
    }

    fn on_warning(&self, table: &str, message: &str) {
        self.reporters
            .iter()
            .for_each(|r| r.on_warning(table, message));
    }

    fn on_progress(&self, table: &str, current: u64, total: u64) {
        self.reporters
            .iter()
            .for_each(|r| r.on_progress(table, current, total));
    }

    fn on_error(&self, table: &str, row_id: &str, error: &dyn Error) {
        self.reporters
            .iter()
            .for_each(|r| r.on_error(table, row_id, error));
    }

    fn on_finish(&self, table: &str, result: &RunResult) {
        self.reporters
            .iter()
            .for_each(|r| r.on_finish(table, result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{MemoryReporter, NoopReporter};

    #[test]
    fn every_reporter_sees_every_event() {
        let a = Arc::new(MemoryReporter::new());
        let b = Arc::new(MemoryReporter::new());
        let fanout = FanoutReporter::new(vec![a.clone(), Arc::new(NoopReporter)]).with(b.clone());

        fanout.on_progress("users", 10, 20);
        fanout.on_warning("users", "bad json");

        assert_eq!(a.progress("users"), vec![(10, 20)]);
        assert_eq!(b.progress("users"), vec![(10, 20)]);
        assert_eq!(b.warnings(), vec!["bad json".to_string()]);
    }
}
