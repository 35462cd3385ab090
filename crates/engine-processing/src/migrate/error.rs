use crate::transform::error::TransformError;
use connectors::sql::base::error::DbError;
use model::{
    execution::{failed_row::ProcessingStage, run_result::RunResult},
    spec::table::{SpecError, TableRef},
};
use std::time::Duration;
use thiserror::Error;

/// Table-level failures. Row-level failures never surface here.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),

    #[error("Destination table {destination} does not exist")]
    MissingDestinationTable { destination: TableRef },

    #[error("Failed to check destination table {destination}: {source}")]
    DestinationCheck {
        destination: TableRef,
        #[source]
        source: DbError,
    },

    #[error("Failed to count rows in {table}: {source}")]
    Count {
        table: TableRef,
        #[source]
        source: DbError,
    },

    #[error("Failed to read {table} at offset {offset}: {source}")]
    Fetch {
        table: TableRef,
        offset: u64,
        #[source]
        source: DbError,
    },

    #[error("Failed to load existing keys from {table}: {source}")]
    ExistingKeys {
        table: TableRef,
        #[source]
        source: DbError,
    },
}

/// A table-level error plus the rows the table got through first.
#[derive(Debug)]
pub struct TableFailure {
    pub error: MigrateError,
    /// `None` when the error struck before the rows were counted.
    pub partial: Option<RunResult>,
}

/// Why one row was not written.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Write failed: {0}")]
    Write(#[from] DbError),

    /// The statement may already have reached the server when the wait is
    /// abandoned, so the row can still land in the destination.
    #[error("Write timed out after {}s (the row may still have been written)", .0.as_secs_f64())]
    Timeout(Duration),
}

impl RowError {
    pub fn stage(&self) -> ProcessingStage {
        match self {
            RowError::Transform(_) => ProcessingStage::Transform,
            RowError::Write(_) => ProcessingStage::Load,
            RowError::Timeout(_) => ProcessingStage::Timeout,
        }
    }
}
