use thiserror::Error;

/// Errors raised while reading run settings from the environment.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    /// A variable with no default was not set (or was blank).
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: '{value}' (expected {expected})")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
