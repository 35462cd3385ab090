use crate::settings::{env::EnvReader, error::SettingsError};
use connectors::sql::base::config::{ConnectionConfig, SslSettings};
use std::{collections::HashMap, fmt, path::PathBuf, str::FromStr, time::Duration};

pub mod env;
pub mod error;

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_ROW_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_STORAGE_HOST: &str = "ylooqmqmoufqtxvetxuj.supabase.co";

/// Knobs for one migration run, independent of either database.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationSettings {
    pub batch_size: usize,
    pub row_timeout: Duration,
    pub connect_timeout: Duration,
    pub continue_on_error: bool,
    pub log_dir: PathBuf,
    /// Host whose public-object URLs are rewritten to relative asset paths.
    pub storage_host: String,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            row_timeout: Duration::from_secs(DEFAULT_ROW_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            continue_on_error: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            storage_host: DEFAULT_STORAGE_HOST.to_string(),
        }
    }
}

impl MigrationSettings {
    pub fn from_env(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let env = EnvReader::new(vars);

        let batch_size = env.number_or("MIGRATION_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(SettingsError::InvalidValue {
                var: "MIGRATION_BATCH_SIZE",
                value: "0".into(),
                expected: "a positive integer",
            });
        }

        let row_timeout = env.number_or("MIGRATION_ROW_TIMEOUT_SECS", DEFAULT_ROW_TIMEOUT_SECS)?;
        if row_timeout == 0 {
            return Err(SettingsError::InvalidValue {
                var: "MIGRATION_ROW_TIMEOUT_SECS",
                value: "0".into(),
                expected: "a positive integer",
            });
        }

        Ok(Self {
            batch_size,
            row_timeout: Duration::from_secs(row_timeout),
            connect_timeout: Duration::from_secs(
                env.number_or("MIGRATION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            ),
            continue_on_error: env.bool_or("CONTINUE_ON_ERROR", false)?,
            log_dir: PathBuf::from(env.string_or("MIGRATION_LOG_DIR", DEFAULT_LOG_DIR)),
            storage_host: env.string_or("SUPABASE_STORAGE_HOST", DEFAULT_STORAGE_HOST),
        })
    }
}

/// Which side of the migration a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Destination,
}

/// Environment variable names and defaults for one endpoint.
struct EndpointVars {
    host: &'static str,
    port: &'static str,
    user: &'static str,
    password: &'static str,
    database: &'static str,
    database_default: Option<&'static str>,
    ssl: &'static str,
    ssl_default: bool,
    ssl_verify: &'static str,
}

static SOURCE_VARS: EndpointVars = EndpointVars {
    host: "SUPABASE_DB_HOST",
    port: "SUPABASE_DB_PORT",
    user: "SUPABASE_DB_USER",
    password: "SUPABASE_DB_PASSWORD",
    database: "SUPABASE_DB_NAME",
    database_default: Some("postgres"),
    ssl: "SUPABASE_DB_SSL",
    ssl_default: true,
    ssl_verify: "SUPABASE_DB_SSL_REJECT_UNAUTHORIZED",
};

static DESTINATION_VARS: EndpointVars = EndpointVars {
    host: "HOST_DB",
    port: "PORT_DB",
    user: "USER_DB",
    password: "PASS_DB",
    database: "NAME_DB",
    database_default: None,
    ssl: "DB_SSL",
    ssl_default: false,
    ssl_verify: "DB_SSL_REJECT_UNAUTHORIZED",
};

impl Endpoint {
    fn vars(self) -> &'static EndpointVars {
        match self {
            Endpoint::Source => &SOURCE_VARS,
            Endpoint::Destination => &DESTINATION_VARS,
        }
    }

    pub fn connection_config(
        self,
        vars: &HashMap<String, String>,
        connect_timeout: Duration,
    ) -> Result<ConnectionConfig, SettingsError> {
        let names = self.vars();
        let env = EnvReader::new(vars);

        let database = match names.database_default {
            Some(default) => env.string_or(names.database, default),
            None => env.required(names.database)?,
        };

        Ok(ConnectionConfig {
            host: env.required(names.host)?,
            port: env.number_or(names.port, 5432u16)?,
            user: env.required(names.user)?,
            password: env.required(names.password)?,
            database,
            ssl: SslSettings {
                enabled: env.bool_or(names.ssl, names.ssl_default)?,
                verify_certificates: env.bool_or(names.ssl_verify, false)?,
            },
            connect_timeout,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => f.write_str("source"),
            Endpoint::Destination => f.write_str("destination"),
        }
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "supabase" => Ok(Endpoint::Source),
            "destination" | "dest" | "production" => Ok(Endpoint::Destination),
            other => Err(format!("unknown target '{other}'")),
        }
    }
}

/// Both connections plus the run settings.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: ConnectionConfig,
    pub destination: ConnectionConfig,
    pub settings: MigrationSettings,
}

impl RunConfig {
    pub fn from_env(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let settings = MigrationSettings::from_env(vars)?;
        Ok(Self {
            source: Endpoint::Source.connection_config(vars, settings.connect_timeout)?,
            destination: Endpoint::Destination.connection_config(vars, settings.connect_timeout)?,
            settings,
        })
    }
}
