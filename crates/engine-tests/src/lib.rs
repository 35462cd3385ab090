#![allow(dead_code)]

use connectors::sql::base::config::ConnectionConfig;
use engine_config::settings::Endpoint;
use std::{collections::HashMap, env};

pub mod live;
pub mod memory;
pub mod utils;

/// Connection settings for the live Postgres tests, read from the same
/// `HOST_DB`/`USER_DB`/... variables the CLI uses for the destination.
/// `None` when `NAME_DB` is not set.
fn live_pg_config() -> Option<ConnectionConfig> {
    let vars: HashMap<String, String> = env::vars().collect();
    vars.get("NAME_DB")?;
    Endpoint::Destination
        .connection_config(&vars, std::time::Duration::from_secs(10))
        .ok()
}
