use model::spec::table::SpecError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidSpec(#[from] SpecError),

    #[error("Table spec '{0}' is declared more than once")]
    DuplicateSpec(String),

    #[error("Unknown table '{name}'; available: {available}")]
    UnknownTable { name: String, available: String },

    #[error("Catalog contains no table specs")]
    Empty,
}
