pub mod reports;
pub mod schema_gen;
pub mod sqlite;

pub use reports::*;
pub use schema_gen::*;
pub use sqlite::*;
