use connectors::sql::base::error::ConnectorError;
use engine_config::{catalog::error::CatalogError, settings::error::SettingsError};
use thiserror::Error;

/// Errors that stop a run before any table result exists.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectorError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("No tables selected")]
    NothingToRun,
}
