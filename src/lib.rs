pub mod api;
pub mod cli;
pub mod dashboard;
pub mod model;
pub mod record;
pub mod schema;
pub mod seed;
pub mod writer;

pub use cli::{Cli, Commands};
pub use seed::{seed_database, GeneratorConfig, SeedOptions};
pub use writer::WriteSummary;
