use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row that could not be migrated. Recorded, never fatal to its table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedRow {
    /// Row label (e.g. email, then id); `"unknown"` when none is available.
    pub row_id: String,
    pub table: String,
    pub stage: ProcessingStage,
    pub message: String,
    /// Underlying error chain, when it adds anything to `message`.
    pub details: Option<String>,
    pub failed_at: DateTime<Utc>,
}

/// Where in the per-row pipeline the failure occurred.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProcessingStage {
    Transform,
    Load,
    Timeout,
}

impl FailedRow {
    pub fn new(table: &str, row_id: &str, stage: ProcessingStage, message: String) -> Self {
        Self {
            row_id: row_id.to_string(),
            table: table.to_string(),
            stage,
            message,
            details: None,
            failed_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        if details != self.message {
            self.details = Some(details);
        }
        self
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Transform => write!(f, "Transform"),
            ProcessingStage::Load => write!(f, "Load"),
            ProcessingStage::Timeout => write!(f, "Timeout"),
        }
    }
}

impl std::fmt::Display for FailedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.row_id, self.message)
    }
}
