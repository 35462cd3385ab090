use connectors::sql::base::error::{ConnectorError, DbError};
use engine_config::{catalog::error::CatalogError, settings::error::SettingsError};
use engine_runtime::error::MigrationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read env file {path}: {source}")]
    EnvFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid env file {path}: {reason} at line {line}")]
    EnvFileParse {
        path: PathBuf,
        line: usize,
        reason: &'static str,
    },

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to load the table catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to run the migration: {0}")]
    Runner(#[from] MigrationError),

    #[error("Failed to connect: {0}")]
    Connection(#[from] ConnectorError),

    #[error("Connection check failed: {0}")]
    Ping(#[from] DbError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to write report to {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
