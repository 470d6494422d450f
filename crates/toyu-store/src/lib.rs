//! Persistent store for masters and delivery records

mod database;
pub mod migration;
pub mod rows;
mod sqlite_error;

pub use database::{Database, DATABASE_FILE, SCHEMA_VERSION};
pub use migration::{Migration, MIGRATIONS};
