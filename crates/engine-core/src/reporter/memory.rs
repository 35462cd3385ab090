use crate::{error::error_chain, reporter::Reporter};
use model::execution::run_result::RunResult;
use std::{error::Error, sync::Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Log { table: String, message: String },
    Warning { table: String, message: String },
    Progress { table: String, current: u64, total: u64 },
    Error { table: String, row_id: String, message: String },
    Finish { table: String, result: RunResult },
}

/// Records every event in order. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn progress(&self, table: &str) -> Vec<(u64, u64)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Progress {
                    table: t,
                    current,
                    total,
                } if t == table => Some((current, total)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self, table: &str) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Error {
                    table: t,
                    row_id,
                    message,
                } if t == table => Some((row_id, message)),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Warning { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<RunResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Finish { result, .. } => Some(result),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Reporter for MemoryReporter {
    fn on_log(&self, table: &str, message: &str) {
        self.push(ReportEvent::Log {
            table: table.to_string(),
            message: message.to_string(),
        });
    }

    fn on_warning(&self, table: &str, message: &str) {
        self.push(ReportEvent::Warning {
            table: table.to_string(),
            message: message.to_string(),
        });
    }

    fn on_progress(&self, table: &str, current: u64, total: u64) {
        self.push(ReportEvent::Progress {
            table: table.to_string(),
            current,
            total,
        });
    }

    fn on_error(&self, table: &str, row_id: &str, error: &dyn Error) {
        self.push(ReportEvent::Error {
            table: table.to_string(),
            row_id: row_id.to_string(),
            message: error_chain(error),
        });
    }

    fn on_finish(&self, table: &str, result: &RunResult) {
        self.push(ReportEvent::Finish {
            table: table.to_string(),
            result: result.clone(),
        });
    }
}
