use crate::sql::base::{config::ConnectionConfig, error::ConnectorError};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, error};

pub(crate) async fn connect_client(config: &ConnectionConfig) -> Result<Client, ConnectorError> {
    if config.host.trim().is_empty() {
        return Err(ConnectorError::InvalidConfig("host is empty".into()));
    }

    let pg_config = config.to_pg_config();
    let endpoint = config.endpoint();
    debug!(%endpoint, tls = config.ssl.enabled, "Connecting to Postgres");

    let connect = async {
        if config.ssl.enabled {
            connect_with_tls(pg_config, config.ssl.verify_certificates).await
        } else {
            connect_without_tls(pg_config).await
        }
    };

    match tokio::time::timeout(config.connect_timeout, connect).await {
        Ok(result) => result,
        Err(_) => Err(ConnectorError::Timeout {
            endpoint,
            timeout: config.connect_timeout,
        }),
    }
}

pub(crate) async fn connect_with_tls(
    config: Config,
    verify_certificates: bool,
) -> Result<Client, ConnectorError> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(!verify_certificates)
        .danger_accept_invalid_hostnames(!verify_certificates)
        .build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

pub(crate) async fn connect_without_tls(config: Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

/// Parses array text in JSON form, Postgres `{a,b}` form, or as a plain
/// comma-separated list.
pub(crate) fn parse_array_string(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(json_vec) = serde_json::from_str::<Vec<String>>(trimmed) {
        return json_vec;
    }

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        let inner = &trimmed[1..trimmed.len() - 1];
        return inner
            .split(',')
            .map(|item| unescape_array_item(item.trim()))
            .filter(|item| !item.is_empty())
            .collect();
    }

    trimmed
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.trim_matches('"').trim_matches('\'').to_string())
        .collect()
}

fn unescape_array_item(raw: &str) -> String {
    let unquoted = raw.trim_matches('"');
    let mut result = String::new();
    let mut chars = unquoted.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(ch);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_array_spellings() {
        assert_eq!(parse_array_string(r#"["a","b"]"#), vec!["a", "b"]);
        assert_eq!(parse_array_string(r#"{wool,"cot\"ton"}"#), vec!["wool", "cot\"ton"]);
        assert_eq!(parse_array_string("clay, 'glass'"), vec!["clay", "glass"]);
        assert!(parse_array_string("{}").is_empty());
        assert!(parse_array_string("  ").is_empty());
    }
}
