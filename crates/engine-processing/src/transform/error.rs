use thiserror::Error;

/// A row that cannot be shaped into its destination form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Source row has no column '{column}' (needed for '{destination}')")]
    MissingSourceColumn { column: String, destination: String },

    #[error("Primary key column '{0}' is NULL after transform")]
    NullPrimaryKey(String),
}
