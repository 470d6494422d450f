//! Infrastructure layer - persistence implementations, file codecs

pub mod backup;
pub mod file_sink;
pub mod master_file;
pub mod persistence;
pub mod sales_csv;

pub use file_sink::DirectorySink;
pub use persistence::{SqliteMasterRepository, SqliteRecordLedger};
