use crate::error::CliError;
use async_trait::async_trait;
use connectors::sql::{
    base::{adapter::SqlAdapter, config::ConnectionConfig},
    postgres::adapter::PgAdapter,
};
use engine_config::settings::Endpoint;
use tracing::{error, info};

/// Trait for "pinging" a database
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct PostgresConnectionPinger {
    pub target: Endpoint,
    pub config: ConnectionConfig,
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let endpoint = self.config.endpoint();
        info!(role = %self.target, %endpoint, ssl = self.config.ssl.enabled, "Pinging Postgres");

        let adapter = PgAdapter::connect(&self.config).await.inspect_err(|e| {
            error!(role = %self.target, %endpoint, "Connection failed: {e}");
        })?;

        let rows = adapter
            .query_rows("SELECT 1 AS ok", Vec::new())
            .await
            .inspect_err(|e| error!(role = %self.target, %endpoint, "Ping query failed: {e}"))?;

        let value = rows.first().and_then(|row| row.get_value("ok").as_i64());
        if value != Some(1) {
            let msg = format!("Ping to {endpoint} returned unexpected result: {value:?}");
            error!("{msg}");
            return Err(CliError::Unexpected(msg));
        }

        info!(role = %self.target, %endpoint, "Ping succeeded");
        Ok(())
    }
}
