use chrono::{DateTime, Utc};
use engine_config::settings::{DEFAULT_STORAGE_HOST, MigrationSettings};

/// Run-wide inputs to the transform rules.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Host whose public-object URLs are rewritten.
    pub storage_host: String,
    fixed_now: Option<DateTime<Utc>>,
}

impl TransformContext {
    pub fn new(storage_host: &str) -> Self {
        Self {
            storage_host: storage_host.to_string(),
            fixed_now: None,
        }
    }

    /// Pins the clock used by `DefaultValue::Now`.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_HOST)
    }
}

impl From<&MigrationSettings> for TransformContext {
    fn from(settings: &MigrationSettings) -> Self {
        Self::new(&settings.storage_host)
    }
}
