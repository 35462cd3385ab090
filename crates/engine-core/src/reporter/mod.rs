//! Sinks for table-migration narration: progress, row errors, summaries.
//!
//! Reporters are append-only and best effort. A reporter never fails the
//! migration; write errors are swallowed after a `tracing` warning.

use model::execution::run_result::RunResult;
use std::error::Error;

pub mod fanout;
pub mod file;
pub mod memory;

pub use fanout::FanoutReporter;
pub use file::FileReporter;
pub use memory::{MemoryReporter, ReportEvent};

pub trait Reporter: Send + Sync {
    /// Phase narration ("counting rows", "fetching page 3").
    fn on_log(&self, table: &str, message: &str);

    fn on_warning(&self, table: &str, message: &str);

    /// Called with already-throttled progress ticks.
    fn on_progress(&self, table: &str, current: u64, total: u64);

    fn on_error(&self, table: &str, row_id: &str, error: &dyn Error);

    fn on_finish(&self, table: &str, result: &RunResult);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn on_log(&self, _table: &str, _message: &str) {}
    fn on_warning(&self, _table: &str, _message: &str) {}
    fn on_progress(&self, _table: &str, _current: u64, _total: u64) {}
    fn on_error(&self, _table: &str, _row_id: &str, _error: &dyn Error) {}
    fn on_finish(&self, _table: &str, _result: &RunResult) {}
}

/// Summary block written when a table finishes.
pub fn summary_block(table: &str, result: &RunResult) -> String {
    let mut block = format!("Summary for {table}\n");
    block.push_str(&format!("  total:        {}\n", result.total));
    block.push_str(&format!("  success:      {}\n", result.succeeded));
    if result.skipped > 0 {
        block.push_str(&format!("  skipped:      {}\n", result.skipped));
    }
    block.push_str(&format!("  failed:       {}\n", result.failed));
    block.push_str(&format!("  success rate: {:.1}%\n", result.success_rate()));
    block.push_str(&format!(
        "  duration:     {:.2}s\n",
        result.duration.as_secs_f64()
    ));
    if let Some(error) = &result.error {
        block.push_str(&format!("  error:        {error}\n"));
    }
    block
}
