use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::seed::DEFAULT_SEED;

#[derive(Parser, Debug)]
#[command(name = "backoffice-mock")]
#[command(version, about = "Seed, serve and browse a mock back-office database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the dashboard finds the dump API
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Base URL of the dump API
    #[arg(long = "api", env = "API_BASE", default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "API_TOKEN")]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and fill it with synthetic data
    Seed {
        /// SQLite database path
        #[arg(long, env = "DB_PATH", default_value = "backoffice_mock.db")]
        db: PathBuf,

        /// RNG seed; the same seed gives the same data
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Number of associates
        #[arg(long, default_value_t = 50)]
        associates: usize,

        /// Number of events
        #[arg(long, default_value_t = 6)]
        events: usize,

        /// Number of invoices
        #[arg(long, default_value_t = 220)]
        invoices: usize,

        /// Delete the database file before seeding
        #[arg(long)]
        fresh: bool,

        /// Hide progress bars
        #[arg(long)]
        no_progress: bool,
    },

    /// Serve the dump API and the static front-end
    Serve {
        /// SQLite database path
        #[arg(long, env = "DB_PATH", default_value = "backoffice_mock.db")]
        db: PathBuf,

        /// Directory with the static front-end
        #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
        public_dir: PathBuf,

        /// Address to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },

    /// Browse the dump in a terminal dashboard
    Dashboard {
        #[command(flatten)]
        api: ApiArgs,

        /// Directory CSV exports are written to
        #[arg(long, default_value = ".")]
        export_dir: PathBuf,
    },

    /// Export one dashboard tab as CSV
    Export {
        #[command(flatten)]
        api: ApiArgs,

        /// Tab key, e.g. `invoices` or `reports.monthly_revenue`
        #[arg(short, long)]
        tab: String,

        /// Keep only rows containing this text
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Output CSV path (defaults to the tab's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the generated DDL
    Schema,

    /// List all table names
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
