use async_trait::async_trait;
use connectors::sql::{
    base::{
        adapter::SqlAdapter, config::ConnectionConfig, destination::DbDataDestination,
        error::ConnectorError, source::DbDataSource,
    },
    postgres::{adapter::PgAdapter, destination::PgDestination, source::PgSource},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Source and destination handles for one run.
#[derive(Clone)]
pub struct Connections {
    pub source: Arc<dyn DbDataSource>,
    pub destination: Arc<dyn DbDataDestination>,
}

/// Opens both endpoints for a run and owns their teardown.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Either both handles or an error; a half-open pair is closed before
    /// the error is returned.
    async fn open(&self) -> Result<Connections, ConnectorError>;

    async fn close(&self, connections: Connections);
}

/// Opens connections, lends them to `f`, and closes them once `f` is done.
pub async fn with_handles<P, F, T>(provider: &P, f: F) -> Result<T, ConnectorError>
where
    P: ConnectionProvider + ?Sized,
    F: AsyncFnOnce(&Connections) -> T,
{
    let connections = provider.open().await?;
    let out = f(&connections).await;
    provider.close(connections).await;
    Ok(out)
}

pub struct PgConnectionProvider {
    source: ConnectionConfig,
    destination: ConnectionConfig,
}

impl PgConnectionProvider {
    pub fn new(source: ConnectionConfig, destination: ConnectionConfig) -> Self {
        Self {
            source,
            destination,
        }
    }

    async fn connect(config: &ConnectionConfig, role: &str) -> Result<PgAdapter, ConnectorError> {
        info!(role, endpoint = %config.endpoint(), ssl = config.ssl.enabled, "Connecting");
        let adapter = PgAdapter::connect(config).await?;
        adapter.ping().await?;
        info!(role, endpoint = %adapter.endpoint(), "Connected");
        Ok(adapter)
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    async fn open(&self) -> Result<Connections, ConnectorError> {
        let source = Self::connect(&self.source, "source").await?;

        let destination = match Self::connect(&self.destination, "destination").await {
            Ok(destination) => destination,
            Err(err) => {
                warn!(endpoint = %source.endpoint(), "Closing source after destination failed");
                drop(source);
                return Err(err);
            }
        };

        Ok(Connections {
            source: Arc::new(PgSource::new(source)),
            destination: Arc::new(PgDestination::new(destination)),
        })
    }

    async fn close(&self, connections: Connections) {
        // Dropping the last client handle ends its connection task.
        drop(connections);
        info!(
            source = %self.source.endpoint(),
            destination = %self.destination.endpoint(),
            "Connections closed"
        );
    }
}
