//! Persistence implementations
//!
//! SQLite-backed implementations of the repository traits. Both share one
//! [`toyu_store::Database`] handle.

mod sqlite_master_repo;
mod sqlite_record_ledger;

pub use sqlite_master_repo::SqliteMasterRepository;
pub use sqlite_record_ledger::SqliteRecordLedger;
