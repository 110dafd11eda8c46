//! Read-only HTTP API over the seeded database

pub mod dump;
pub mod error;
pub mod server;

pub use dump::{read_dump, DumpError, DumpResponse, Totals};
pub use error::ApiError;
pub use server::{router, serve, ServerConfig};
