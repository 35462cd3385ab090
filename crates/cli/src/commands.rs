use clap::Subcommand;
use engine_config::settings::Endpoint;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate every catalog table in dependency order
    RunAll {
        #[arg(
            long,
            value_delimiter = ',',
            help = "Only migrate these tables (comma separated); catalog order is kept"
        )]
        only: Vec<String>,

        #[arg(long, help = "JSON catalog file replacing the built-in table specs")]
        catalog: Option<PathBuf>,

        #[arg(
            long,
            help = "Keep going after a table-level failure (overrides CONTINUE_ON_ERROR)"
        )]
        continue_on_error: bool,

        #[arg(long, help = "Write the JSON run report to this file")]
        report: Option<PathBuf>,
    },
    /// Migrate a single table: connect, copy, disconnect
    Migrate {
        /// Catalog name, e.g. `users` or `artisan-shops`
        table: String,

        #[arg(long, help = "JSON catalog file replacing the built-in table specs")]
        catalog: Option<PathBuf>,

        #[arg(long, help = "Write the JSON run report to this file")]
        report: Option<PathBuf>,
    },
    /// Print the catalog in run order
    List {
        #[arg(long, help = "JSON catalog file replacing the built-in table specs")]
        catalog: Option<PathBuf>,

        #[arg(long, help = "Print the catalog as JSON")]
        json: bool,
    },
    /// Check that a database is reachable with the configured credentials
    TestConn {
        /// `source` (Supabase) or `destination` (production)
        #[arg(long)]
        target: Endpoint,
    },
}
