use crate::{
    error::{ReporterError, error_chain},
    progress::percent,
    reporter::{Reporter, summary_block},
};
use chrono::{Local, SecondsFormat, Utc};
use model::execution::run_result::RunResult;
use std::{
    collections::HashMap,
    error::Error,
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{error, info, warn};

struct TableLog {
    path: PathBuf,
    file: File,
}

/// Writes one append-only log file per table invocation,
/// `<dir>/<table>_<YYYYmmdd-HHMMSS>.log`, and mirrors every event to `tracing`.
///
/// The file opens on the table's first event and closes on `on_finish`.
pub struct FileReporter {
    dir: Option<PathBuf>,
    open: Mutex<HashMap<String, TableLog>>,
    written: Mutex<Vec<PathBuf>>,
}

impl FileReporter {
    pub fn try_new(dir: impl Into<PathBuf>) -> Result<Self, ReporterError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ReporterError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self::with_dir(Some(dir)))
    }

    /// Like `try_new`, but degrades to `tracing`-only output when the
    /// directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        match Self::try_new(dir) {
            Ok(reporter) => reporter,
            Err(err) => {
                warn!(error = %err, "Table log files disabled");
                Self::with_dir(None)
            }
        }
    }

    fn with_dir(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            open: Mutex::new(HashMap::new()),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Every log file opened so far, in order.
    pub fn log_files(&self) -> Vec<PathBuf> {
        self.written
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    fn file_name(table: &str) -> String {
        let safe: String = table
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        format!("{}_{}.log", safe, Local::now().format("%Y%m%d-%H%M%S"))
    }

    fn open_log(dir: &Path, table: &str) -> Result<TableLog, ReporterError> {
        let path = dir.join(Self::file_name(table));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ReporterError::OpenFile {
                path: path.clone(),
                source,
            })?;
        Ok(TableLog { path, file })
    }

    fn append(&self, table: &str, level: &str, message: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(mut open) = self.open.lock() else {
            return;
        };

        if !open.contains_key(table) {
            match Self::open_log(dir, table) {
                Ok(log) => {
                    if let Ok(mut written) = self.written.lock() {
                        written.push(log.path.clone());
                    }
                    open.insert(table.to_string(), log);
                }
                Err(err) => {
                    warn!(table, error = %err, "Skipping table log file");
                    return;
                }
            }
        }

        if let Some(log) = open.get_mut(table) {
            let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            for line in message.lines() {
                if let Err(err) = writeln!(log.file, "[{stamp}] {level:<5} {line}") {
                    warn!(path = %log.path.display(), error = %err, "Log write failed");
                    return;
                }
            }
        }
    }

    fn close(&self, table: &str) {
        if let Ok(mut open) = self.open.lock()
            && let Some(mut log) = open.remove(table)
        {
            let _ = log.file.flush();
        }
    }
}

impl Reporter for FileReporter {
    fn on_log(&self, table: &str, message: &str) {
        info!(table, "{message}");
        self.append(table, "INFO", message);
    }

    fn on_warning(&self, table: &str, message: &str) {
        warn!(table, "{message}");
        self.append(table, "WARN", message);
    }

    fn on_progress(&self, table: &str, current: u64, total: u64) {
        let pct = percent(current, total);
        info!(table, current, total, "Progress {current}/{total} ({pct:.1}%)");
        self.append(
            table,
            "INFO",
            &format!("progress {current}/{total} ({pct:.1}%)"),
        );
    }

    fn on_error(&self, table: &str, row_id: &str, error: &dyn Error) {
        let chain = error_chain(error);
        error!(table, row_id, error = %chain, "Row failed");
        self.append(table, "ERROR", &format!("row {row_id}: {chain}"));
    }

    fn on_finish(&self, table: &str, result: &RunResult) {
        info!(
            table,
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            duration_ms = result.duration.as_millis() as u64,
            "Table finished"
        );
        self.append(table, "INFO", &summary_block(table, result));
        self.close(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("duplicate key value")]
    struct Dup;

    #[test]
    fn writes_one_file_per_table_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = FileReporter::try_new(dir.path()).unwrap();

        reporter.on_log("users", "Counting rows");
        reporter.on_progress("users", 10, 12);
        reporter.on_error("users", "ana@example.com", &Dup);
        reporter.on_finish("users", &RunResult::empty("users").finish(Duration::ZERO));

        let files = reporter.log_files();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("users_") && name.ends_with(".log"));

        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert!(contents.contains("INFO  Counting rows"));
        assert!(contents.contains("progress 10/12 (83.3%)"));
        assert!(contents.contains("ERROR row ana@example.com: duplicate key value"));
        assert!(contents.contains("Summary for users"));
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("migration");
        let reporter = FileReporter::try_new(&nested).unwrap();
        reporter.on_log("products", "hello");
        assert!(nested.is_dir());
        assert_eq!(reporter.log_files().len(), 1);
    }

    #[test]
    fn unusable_directory_degrades_to_tracing_only() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot be used as the log directory.
        let reporter = FileReporter::new(file.path().join("logs"));
        reporter.on_log("users", "still fine");
        assert!(reporter.log_files().is_empty());
    }
}
