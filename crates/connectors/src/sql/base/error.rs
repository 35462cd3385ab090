use std::time::Duration;
use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any error reported by the Postgres driver or server.
    #[error("{}", describe_pg_error(.0))]
    Postgres(#[from] tokio_postgres::Error),

    /// A value could not be converted to the parameter type the server expects.
    #[error("Cannot bind {found} value to column '{column}' of type {expected}: {reason}")]
    Coercion {
        column: String,
        expected: String,
        found: &'static str,
        reason: String,
    },

    /// A column could not be read into a `Value`.
    #[error("Cannot decode column '{column}' of type {data_type}: {reason}")]
    Decode {
        column: String,
        data_type: String,
        reason: String,
    },

    /// The statement and the row disagree on the number of columns.
    #[error("Statement expects {expected} parameters, row provides {found}")]
    ParamCount { expected: usize, found: usize },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection settings: {0}")]
    InvalidConfig(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Could not connect: {}", describe_pg_error(.0))]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Timed out after {}s connecting to {endpoint}", .timeout.as_secs())]
    Timeout { endpoint: String, timeout: Duration },

    #[error("Connection check failed: {0}")]
    Ping(#[from] DbError),
}

/// Server-side errors carry their message in the `DbError` source; the
/// driver's own `Display` only says "db error".
pub fn describe_pg_error(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut msg = format!("{}: {}", db.severity(), db.message());
            if let Some(detail) = db.detail() {
                msg.push_str(&format!(" ({detail})"));
            }
            if let Some(constraint) = db.constraint() {
                msg.push_str(&format!(" [constraint {constraint}]"));
            }
            msg
        }
        None => {
            let mut msg = err.to_string();
            let mut source = std::error::Error::source(err);
            while let Some(cause) = source {
                msg.push_str(&format!(": {cause}"));
                source = cause.source();
            }
            msg
        }
    }
}
